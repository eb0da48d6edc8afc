//! Video playback through VLC's remote-control interface.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::MediaConfig;
use crate::error::{FeedbackError, FeedbackResult};
use crate::feedback::MediaClip;

const STARTUP_POLL: Duration = Duration::from_millis(100);

pub struct MediaController {
    addr: SocketAddr,
    connect_timeout: Duration,
    poster_video: String,
    algorithm_video: String,
    player: Option<Child>,
}

impl MediaController {
    /// Attach to a player listening on `host:port`, launching it first when
    /// configured to. A launched player is given `startup_timeout_ms` to open
    /// its control port before the first command is due.
    pub fn new(config: &MediaConfig) -> FeedbackResult<Self> {
        let addr = resolve(&config.host, config.port)?;
        let player = if config.launch {
            let child = Command::new(&config.vlc_path)
                .args(["--extraintf", "rc"])
                .arg(format!("--rc-host={}:{}", config.host, config.port))
                .args(["--loop", "--no-video-title-show"])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|source| FeedbackError::Spawn {
                    program: config.vlc_path.clone(),
                    source,
                })?;
            info!(pid = child.id(), %addr, "media player launched");
            Some(child)
        } else {
            None
        };

        let media = Self {
            addr,
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            poster_video: config.poster_video.clone(),
            algorithm_video: config.algorithm_video.clone(),
            player,
        };
        if media.player.is_some() {
            if let Err(e) = media.wait_until_ready(Duration::from_millis(config.startup_timeout_ms)) {
                warn!(error = %e, "media player not answering yet");
            }
        }
        Ok(media)
    }

    /// Poll the control port until it accepts a connection or `timeout`
    /// passes.
    pub fn wait_until_ready(&self, timeout: Duration) -> FeedbackResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            match TcpStream::connect_timeout(&self.addr, self.connect_timeout) {
                Ok(_) => {
                    debug!(addr = %self.addr, "media controller ready");
                    return Ok(());
                }
                Err(source) if Instant::now() >= deadline => {
                    return Err(FeedbackError::MediaUnreachable {
                        addr: self.addr.to_string(),
                        source,
                    });
                }
                Err(_) => thread::sleep(STARTUP_POLL),
            }
        }
    }

    pub fn clip_path(&self, clip: MediaClip) -> &str {
        match clip {
            MediaClip::Poster => &self.poster_video,
            MediaClip::Algorithm => &self.algorithm_video,
        }
    }

    /// Replace the playlist with `clip`.
    pub fn play(&mut self, clip: MediaClip) -> FeedbackResult<()> {
        let path = self.clip_path(clip).to_string();
        self.send("clear")?;
        self.send(&format!("add {path}"))
    }

    fn send(&self, command: &str) -> FeedbackResult<()> {
        let mut stream = TcpStream::connect_timeout(&self.addr, self.connect_timeout).map_err(
            |source| FeedbackError::MediaUnreachable {
                addr: self.addr.to_string(),
                source,
            },
        )?;
        stream.set_write_timeout(Some(self.connect_timeout))?;
        stream.write_all(format!("{command}\n").as_bytes())?;
        Ok(())
    }
}

fn resolve(host: &str, port: u16) -> FeedbackResult<SocketAddr> {
    let unreachable = |source: io::Error| FeedbackError::MediaUnreachable {
        addr: format!("{host}:{port}"),
        source,
    };
    (host, port)
        .to_socket_addrs()
        .map_err(unreachable)?
        .next()
        .ok_or_else(|| unreachable(io::Error::new(io::ErrorKind::NotFound, "address did not resolve")))
}

impl Drop for MediaController {
    fn drop(&mut self) {
        if let Some(mut player) = self.player.take() {
            let _ = self.send("stop");
            if let Err(e) = player.kill() {
                warn!(error = %e, "failed to stop media player");
            }
            let _ = player.wait();
        }
    }
}

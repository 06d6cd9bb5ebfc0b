use std::path::PathBuf;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

use super::source::{DecodedImage, ImageSource};
use crate::error::RenderError;

type DecodeResult = Result<DecodedImage, RenderError>;

/// Observable phase of an asynchronous texture load.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoadPhase {
    Empty,
    Loading,
    Ready,
    Failed,
}

enum State {
    Empty,
    Loading(Receiver<DecodeResult>),
    Ready,
    Failed,
}

/// Single-shot completion handle for a pending load.
///
/// Consumed by [`DecodeTicket::complete`], so a load completes at most once.
/// Dropping the ticket without completing it fails the load.
pub struct DecodeTicket {
    tx: Sender<DecodeResult>,
}

impl DecodeTicket {
    pub fn complete(self, result: Result<DecodedImage, RenderError>) {
        // The loader may already be gone (renderer shut down); nothing to do then.
        let _ = self.tx.send(result);
    }
}

/// Texture load state machine: `Empty -> Loading -> Ready | Failed`.
///
/// The decode runs elsewhere and reports back over a one-slot channel. The
/// frame thread calls [`TextureLoader::poll`] once per frame; it never blocks.
/// Every transition is one-way: a finished loader stays finished.
pub struct TextureLoader {
    state: State,
}

impl Default for TextureLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureLoader {
    pub fn new() -> Self {
        Self { state: State::Empty }
    }

    pub fn phase(&self) -> LoadPhase {
        match self.state {
            State::Empty => LoadPhase::Empty,
            State::Loading(_) => LoadPhase::Loading,
            State::Ready => LoadPhase::Ready,
            State::Failed => LoadPhase::Failed,
        }
    }

    /// Moves `Empty -> Loading` and returns the completion handle.
    ///
    /// Returns `None` if a load was already started.
    pub fn begin(&mut self) -> Option<DecodeTicket> {
        if !matches!(self.state, State::Empty) {
            log::warn!("texture load already started; ignoring second request");
            return None;
        }
        let (tx, rx) = bounded(1);
        self.state = State::Loading(rx);
        Some(DecodeTicket { tx })
    }

    /// Starts a load that decodes `path` on a background thread.
    pub fn spawn<Src>(&mut self, source: Src, path: PathBuf) -> bool
    where
        Src: ImageSource + Send + 'static,
    {
        let Some(ticket) = self.begin() else {
            return false;
        };

        let spawned = thread::Builder::new()
            .name("lumen-texture-decode".into())
            .spawn(move || {
                log::debug!("decoding {}", path.display());
                ticket.complete(source.load(&path));
            });

        if let Err(err) = spawned {
            // The ticket went down with the closure; the next poll sees a
            // disconnected channel and fails the load.
            log::error!("failed to spawn texture decode thread: {err}");
        }
        true
    }

    /// Non-blocking check for a finished decode.
    ///
    /// Returns the image exactly once, on the `Loading -> Ready` transition.
    /// The caller is responsible for uploading it.
    pub fn poll(&mut self) -> Option<DecodedImage> {
        let State::Loading(rx) = &self.state else {
            return None;
        };

        match rx.try_recv() {
            Ok(Ok(image)) => {
                log::info!("texture decoded ({}x{})", image.width, image.height);
                self.state = State::Ready;
                Some(image)
            }
            Ok(Err(err)) => {
                log::warn!("texture load failed: {err}");
                self.state = State::Failed;
                None
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("texture decode ended without a result");
                self.state = State::Failed;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::{Duration, Instant};

    use super::*;

    fn image() -> DecodedImage {
        DecodedImage::solid([10, 20, 30, 255])
    }

    #[test]
    fn poll_on_empty_loader_is_a_no_op() {
        let mut loader = TextureLoader::new();
        assert!(loader.poll().is_none());
        assert_eq!(loader.phase(), LoadPhase::Empty);
    }

    #[test]
    fn pending_load_stays_loading() {
        let mut loader = TextureLoader::new();
        let _ticket = loader.begin().unwrap();
        assert_eq!(loader.phase(), LoadPhase::Loading);
        assert!(loader.poll().is_none());
        assert_eq!(loader.phase(), LoadPhase::Loading);
    }

    #[test]
    fn completion_yields_image_once() {
        let mut loader = TextureLoader::new();
        loader.begin().unwrap().complete(Ok(image()));

        assert_eq!(loader.poll(), Some(image()));
        assert_eq!(loader.phase(), LoadPhase::Ready);
        assert!(loader.poll().is_none());
        assert_eq!(loader.phase(), LoadPhase::Ready);
    }

    #[test]
    fn second_begin_is_rejected() {
        let mut loader = TextureLoader::new();
        let _ticket = loader.begin().unwrap();
        assert!(loader.begin().is_none());
    }

    #[test]
    fn error_result_fails_the_load() {
        let mut loader = TextureLoader::new();
        loader.begin().unwrap().complete(Err(RenderError::AssetLoad {
            path: "x.png".into(),
            message: "404".into(),
        }));
        assert!(loader.poll().is_none());
        assert_eq!(loader.phase(), LoadPhase::Failed);
        assert!(loader.begin().is_none());
    }

    #[test]
    fn dropped_ticket_fails_the_load() {
        let mut loader = TextureLoader::new();
        drop(loader.begin().unwrap());
        assert!(loader.poll().is_none());
        assert_eq!(loader.phase(), LoadPhase::Failed);
    }

    struct Fixed;

    impl ImageSource for Fixed {
        fn load(&self, _path: &Path) -> Result<DecodedImage, RenderError> {
            Ok(DecodedImage::solid([1, 2, 3, 4]))
        }
    }

    #[test]
    fn spawned_decode_eventually_becomes_ready() {
        let mut loader = TextureLoader::new();
        assert!(loader.spawn(Fixed, PathBuf::from("fixed.png")));

        let deadline = Instant::now() + Duration::from_secs(5);
        let image = loop {
            if let Some(image) = loader.poll() {
                break image;
            }
            assert!(Instant::now() < deadline, "decode thread never reported");
            thread::sleep(Duration::from_millis(1));
        };

        assert_eq!(image.pixels, vec![1, 2, 3, 4]);
        assert_eq!(loader.phase(), LoadPhase::Ready);
    }
}

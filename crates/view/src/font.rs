//! Asynchronous font acquisition.
//!
//! A [`FontRequest`] is the receiving half of a oneshot channel. The view
//! polls it once per frame and never blocks on it. Dropping the request
//! (for example when the view unmounts) turns any later resolution into a
//! no-op on the sending side.

use futures::channel::oneshot;
use starscape_assets::{FontError, FontSource, load_typeface};
use starscape_render::Typeface;
use std::cell::RefCell;

type FontResult = Result<Typeface, FontError>;

/// Result of polling a [`FontRequest`].
#[derive(Debug)]
pub enum FontPoll {
    Pending,
    Ready(FontResult),
}

/// Pending typeface load.
#[derive(Debug)]
pub struct FontRequest {
    rx: oneshot::Receiver<FontResult>,
}

/// Completes a [`FontRequest`].
#[derive(Debug)]
pub struct FontResolver {
    tx: oneshot::Sender<FontResult>,
}

impl FontRequest {
    pub fn channel() -> (FontResolver, FontRequest) {
        let (tx, rx) = oneshot::channel();
        (FontResolver { tx }, FontRequest { rx })
    }

    /// Check for completion without blocking.
    pub fn poll(&mut self) -> FontPoll {
        match self.rx.try_recv() {
            Ok(Some(result)) => FontPoll::Ready(result),
            Ok(None) => FontPoll::Pending,
            Err(oneshot::Canceled) => FontPoll::Ready(Err(FontError::Canceled)),
        }
    }
}

impl FontResolver {
    /// Deliver the outcome. Returns `false` when nobody is listening anymore.
    pub fn complete(self, result: FontResult) -> bool {
        self.tx.send(result).is_ok()
    }

    pub fn resolve(self, typeface: Typeface) -> bool {
        self.complete(Ok(typeface))
    }

    pub fn reject(self, error: FontError) -> bool {
        self.complete(Err(error))
    }
}

/// Starts typeface loads.
pub trait FontLoader {
    fn load(&self, source: &FontSource) -> FontRequest;
}

/// Loads typefaces on a helper thread through `starscape-assets`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadFontLoader;

impl FontLoader for ThreadFontLoader {
    fn load(&self, source: &FontSource) -> FontRequest {
        let (resolver, request) = FontRequest::channel();
        let source = source.clone();
        let spawned = std::thread::Builder::new()
            .name("font-loader".into())
            .spawn(move || {
                let result = load_typeface(&source);
                if !resolver.complete(result) {
                    tracing::debug!(%source, "font arrived after its view went away");
                }
            });
        if let Err(e) = spawned {
            // The resolver moved into the failed closure and was dropped, so
            // the request reports `Canceled` on its first poll.
            tracing::error!("failed to spawn font loader thread: {e}");
        }
        request
    }
}

/// Loader whose requests are completed by hand.
///
/// Each call to [`load`](FontLoader::load) queues a resolver; callers pop
/// them with [`take_resolver`](ManualFontLoader::take_resolver) and decide
/// when and how the font arrives.
#[derive(Debug, Default)]
pub struct ManualFontLoader {
    requested: RefCell<Vec<(FontSource, FontResolver)>>,
}

impl ManualFontLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.requested.borrow().len()
    }

    /// Oldest outstanding resolver and the source it was requested for.
    pub fn take_resolver(&self) -> Option<(FontSource, FontResolver)> {
        let mut requested = self.requested.borrow_mut();
        if requested.is_empty() {
            None
        } else {
            Some(requested.remove(0))
        }
    }
}

impl FontLoader for ManualFontLoader {
    fn load(&self, source: &FontSource) -> FontRequest {
        let (resolver, request) = FontRequest::channel();
        self.requested.borrow_mut().push((source.clone(), resolver));
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_typeface;

    #[test]
    fn request_stays_pending_until_resolved() {
        let (resolver, mut request) = FontRequest::channel();
        assert!(matches!(request.poll(), FontPoll::Pending));
        assert!(resolver.resolve(test_typeface()));
        assert!(matches!(request.poll(), FontPoll::Ready(Ok(_))));
    }

    #[test]
    fn dropped_resolver_reports_canceled() {
        let (resolver, mut request) = FontRequest::channel();
        drop(resolver);
        assert!(matches!(
            request.poll(),
            FontPoll::Ready(Err(FontError::Canceled))
        ));
    }

    #[test]
    fn resolving_after_request_dropped_is_harmless() {
        let (resolver, request) = FontRequest::channel();
        drop(request);
        assert!(!resolver.resolve(test_typeface()));
    }

    #[test]
    fn manual_loader_queues_resolvers() {
        let loader = ManualFontLoader::new();
        let mut request = loader.load(&FontSource::parse("a.json"));
        assert_eq!(loader.pending(), 1);

        let (source, resolver) = loader.take_resolver().unwrap();
        assert_eq!(source, FontSource::parse("a.json"));
        assert!(resolver.reject(FontError::Status(404)));
        assert!(matches!(
            request.poll(),
            FontPoll::Ready(Err(FontError::Status(404)))
        ));
        assert!(loader.take_resolver().is_none());
    }

    #[test]
    fn thread_loader_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = ThreadFontLoader.load(&FontSource::Path(dir.path().join("none.json")));
        let outcome = loop {
            match request.poll() {
                FontPoll::Pending => std::thread::sleep(std::time::Duration::from_millis(5)),
                FontPoll::Ready(result) => break result,
            }
        };
        assert!(matches!(outcome, Err(FontError::Io(_))));
    }
}

//! Platform to fetcher dispatch

use super::profile::FetchProfile;
use super::traits::{FetcherCapabilities, MediaFetcher};
use super::unavailable::UnavailableFetcher;
use super::ytdlp::{YtDlpFetcher, locate_ffmpeg, locate_yt_dlp};
use crate::config::FetcherConfig;
use crate::types::Platform;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Maps each [`Platform`] to the fetcher that handles it
///
/// Platforms without a registered fetcher (including [`Platform::Unknown`])
/// go to the generic fetcher.
#[derive(Clone)]
pub struct FetcherRouter {
    generic: Arc<dyn MediaFetcher>,
    dedicated: HashMap<Platform, Arc<dyn MediaFetcher>>,
}

impl FetcherRouter {
    /// Router that sends every platform to `generic`
    pub fn new(generic: Arc<dyn MediaFetcher>) -> Self {
        Self {
            generic,
            dedicated: HashMap::new(),
        }
    }

    /// Register a dedicated fetcher for `platform`
    pub fn with_platform(mut self, platform: Platform, fetcher: Arc<dyn MediaFetcher>) -> Self {
        self.dedicated.insert(platform, fetcher);
        self
    }

    /// Build the production router from configuration
    ///
    /// With yt-dlp present, every platform that has a [`FetchProfile`] gets a
    /// [`YtDlpFetcher`] tuned for it and the rest share the generic profile.
    /// Without yt-dlp all requests go to [`UnavailableFetcher`].
    pub fn from_config(config: &FetcherConfig) -> Self {
        let Some(yt_dlp) = locate_yt_dlp(config) else {
            warn!("yt-dlp not found; download requests will fail until it is installed");
            return Self::new(Arc::new(UnavailableFetcher));
        };

        let ffmpeg = locate_ffmpeg(config);
        match &ffmpeg {
            Some(path) => info!(yt_dlp = ?yt_dlp, ffmpeg = ?path, "media tools located"),
            None => warn!(
                yt_dlp = ?yt_dlp,
                "ffmpeg not found; YouTube and MP3 downloads will fail"
            ),
        }

        let build = |profile: FetchProfile| -> Arc<dyn MediaFetcher> {
            Arc::new(YtDlpFetcher::new(yt_dlp.clone(), profile, config).with_ffmpeg(ffmpeg.clone()))
        };

        FetchProfile::dedicated_platforms()
            .into_iter()
            .fold(Self::new(build(FetchProfile::generic())), |router, platform| {
                router.with_platform(platform, build(FetchProfile::for_platform(platform)))
            })
    }

    /// Fetcher responsible for `platform`
    pub fn for_platform(&self, platform: Platform) -> Arc<dyn MediaFetcher> {
        self.dedicated
            .get(&platform)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.generic))
    }

    /// The fallback fetcher
    pub fn generic(&self) -> &Arc<dyn MediaFetcher> {
        &self.generic
    }

    /// Capabilities of the generic fetcher
    pub fn capabilities(&self) -> FetcherCapabilities {
        self.generic.capabilities()
    }
}

impl std::fmt::Debug for FetcherRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut dedicated: Vec<(Platform, &'static str)> = self
            .dedicated
            .iter()
            .map(|(platform, fetcher)| (*platform, fetcher.name()))
            .collect();
        dedicated.sort();

        f.debug_struct("FetcherRouter")
            .field("generic", &self.generic.name())
            .field("dedicated", &dedicated)
            .finish()
    }
}

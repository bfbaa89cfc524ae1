/// Placeholder shown by actions that are not built yet
pub const FEATURE_UPGRADING: &str = "Chức năng đang nâng cấp";

/// A short-lived status message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice(pub String);

impl Notice {
    pub fn upgrading() -> Self {
        Self(FEATURE_UPGRADING.to_string())
    }
}

/// Actions behind the composer icons (attach, send file, language).
///
/// Every default just reports that the feature is not available yet.
pub trait FeatureHooks: Send + Sync {
    fn attach(&self) -> Option<Notice> {
        Some(Notice::upgrading())
    }

    fn send_file(&self) -> Option<Notice> {
        Some(Notice::upgrading())
    }

    fn language(&self) -> Option<Notice> {
        Some(Notice::upgrading())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl FeatureHooks for NoopHooks {}

/// Path prefixes that are never logged.
///
/// Documentation UI, schema and metadata endpoints, the log viewer itself
/// (so reading logs does not create logs), and browser asset probes.
pub const EXCLUDED_PATH_PREFIXES: &[&str] = &[
    "/logger/",
    "/swagger/",
    "/redoc/",
    "/api/schema/",
    "/health-check/",
    "/favicon.ico",
    "/robots.txt",
    "/sitemap.xml",
    "/favicon-32x32.png",
    "/favicon-16x16.png",
    "/site.webmanifest",
    "/apple-touch-icon.png",
    "/apple-touch-icon-precomposed.png",
];

#[inline]
pub fn should_log(path: &str) -> bool {
    !EXCLUDED_PATH_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// The fixed prefixes plus any added for this deployment, such as the
/// configured metrics route.
#[derive(Debug, Clone, Default)]
pub struct PathExclusions {
    extra: Vec<String>,
}

impl PathExclusions {
    pub fn with(mut self, prefix: &str) -> Self {
        let prefix = prefix.trim();
        if !prefix.is_empty() {
            let prefix = if prefix.starts_with('/') {
                prefix.to_string()
            } else {
                format!("/{prefix}")
            };
            self.extra.push(prefix);
        }
        self
    }

    #[inline]
    pub fn should_log(&self, path: &str) -> bool {
        should_log(path) && !self.extra.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}

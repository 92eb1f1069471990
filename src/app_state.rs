use crate::cli::CommandLineArgs;
use crate::error::TransposeError;
use crate::manifest::Manifest;
use crate::source::SourceFetcher;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use expanduser::expanduser;

/// Shared application state passed to each request handler.
///
/// Holds no report data: every request fetches and transposes its source afresh.
pub struct AppState {
    /// Manifests by report name.
    pub manifests: HashMap<String, Manifest>,

    /// Source data fetcher.
    pub fetcher: SourceFetcher,
}

impl AppState {
    /// Create and return an [AppState], loading every manifest named in the arguments.
    pub fn new(args: &CommandLineArgs) -> Result<Self, TransposeError> {
        let mut manifests = HashMap::new();
        for manifest_path in &args.manifests {
            let path = expanduser(manifest_path).map_err(|source| {
                TransposeError::ManifestRead {
                    path: manifest_path.into(),
                    source,
                }
            })?;
            let name = report_name(&path);
            let manifest = Manifest::load(&path)?;
            tracing::info!(report = %name, source = %manifest.source, "loaded manifest");
            if manifests.insert(name.clone(), manifest).is_some() {
                return Err(TransposeError::DuplicateReport { name });
            }
        }
        let fetcher = SourceFetcher::new(args.source_timeout.map(Duration::from_secs))?;
        Ok(Self { manifests, fetcher })
    }
}

/// Returns the name under which the report defined by a manifest file is served: the file stem.
pub fn report_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;

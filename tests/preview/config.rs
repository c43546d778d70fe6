use prismic_preview::{ConfigError, PreviewOptions, PreviewSession};

use crate::support::{registry, Stubs, StubConnector, DIGEST};

#[test]
fn empty_repository_name_is_rejected() {
    let stubs = Stubs::new(StubConnector::default());
    let err = PreviewSession::new(PreviewOptions::new(" "), &registry(), stubs.deps())
        .err()
        .unwrap();
    assert_eq!(err, ConfigError::MissingRepositoryName);
}

#[test]
fn unpublished_repository_is_rejected() {
    let stubs = Stubs::new(StubConnector::default());
    let err = PreviewSession::new(PreviewOptions::new("other"), &registry(), stubs.deps())
        .err()
        .unwrap();
    assert_eq!(
        err,
        ConfigError::MissingRegistryEntry {
            repository: "other".into()
        }
    );
}

#[test]
fn caller_options_overlay_published_ones() {
    let stubs = Stubs::new(StubConnector::default());
    let session = PreviewSession::new(
        PreviewOptions::new("repo").lang("fr-fr"),
        &registry(),
        stubs.deps(),
    )
    .unwrap();

    let config = session.config();
    assert_eq!(config.lang, "fr-fr");
    assert_eq!(config.schemas_digest, DIGEST);
    assert_eq!(
        config.type_paths_filename(),
        format!("prismic-typepaths---repo-{}.json", DIGEST)
    );
}

use std::fmt;
use std::path::PathBuf;

/// Result alias used by the class-file and type-graph layers.
pub(crate) type Result<T> = std::result::Result<T, Error>;

/// Failures raised while decoding archives and building the type graph.
#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("malformed class file: {0}")]
    MalformedClassFile(String),
    #[error("unsupported class file version {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },
    #[error("malformed descriptor `{descriptor}`: {reason}")]
    MalformedDescriptor { descriptor: String, reason: String },
    #[error("archive not found: {}", .0.display())]
    MissingArchive(PathBuf),
    #[error("duplicate {kind} `{member}` in {class}")]
    DuplicateMember {
        class: String,
        kind: MemberKind,
        member: String,
    },
    #[error("failed to read archive {}: {source}", path.display())]
    MissingReference {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedClassFile(message.into())
    }

    pub(crate) fn descriptor(descriptor: &str, reason: impl Into<String>) -> Self {
        Error::MalformedDescriptor {
            descriptor: descriptor.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing_reference(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::MissingReference {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Member category reported by [`Error::DuplicateMember`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MemberKind {
    BaseType,
    Field,
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MemberKind::BaseType => "base type",
            MemberKind::Field => "field",
            MemberKind::Method => "method",
        };
        f.write_str(label)
    }
}

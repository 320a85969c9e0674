use std::io;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("relation `{relation}` needs at least 2 entities, got {found}")]
    TooFewEntities { relation: String, found: usize },

    #[error(
        "relation `{relation}`: cardinality must be given for all entities or none \
         (`{entity}` differs from the first participant)"
    )]
    MixedCardinality { relation: String, entity: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("ambiguous composite attribute `{definition}`: only one `:` is allowed")]
    AmbiguousComposite { definition: String },

    #[error("invalid attribute definition `{definition}`: expected `[*+~]name[[]]`")]
    InvalidToken { definition: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("entity `{entity}` is listed more than once")]
    DuplicateEntity { entity: String },

    #[error("edge refers to node `{id}`, which was never created")]
    UnknownNode { id: String },

    #[error("relation `{relation}` refers to entity `{entity}`, which is not in the entity list")]
    UnknownEntity { relation: String, entity: String },
}

#[derive(Debug, Error)]
pub enum ErdError {
    #[error("invalid model: {0}")]
    Model(#[from] ModelError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("layout engine `{engine}` exited with {status}: {stderr}")]
    Engine {
        engine: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("failed to launch layout engine `{engine}`: {source}")]
    EngineLaunch {
        engine: String,
        #[source]
        source: io::Error,
    },
}

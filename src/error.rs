//! Error types returned by the topology engine.

use thiserror::Error;

use crate::nets::NetId;

/// Rejection of a proposed wire by the connection merger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("terminals belong to different nets: {0} and {1}")]
    DifferentNets(NetId, NetId),

    #[error("no unused net id left")]
    Exhausted,
}

/// A single problem found while compiling a circuit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} pin {1} is not connected")]
    OpenConnection(String, u8),

    #[error("component {0} has a malformed designator")]
    MalformedDesignator(String),

    #[error("designator {0} is used by more than one component")]
    DuplicateDesignator(String),

    #[error("circuit has no ground")]
    MissingGround,
}

/// Failure of an explicit net rename.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetIdError {
    #[error("net {0} does not exist")]
    NotFound(NetId),

    #[error("net {0} already exists")]
    AlreadyExists(NetId),

    #[error("net 0 is reserved for ground")]
    Reserved,
}

/// Netlist export was requested before a successful compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("circuit has not been compiled since its last change")]
pub struct NotChecked;

/// Errors raised by the circuit editing API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    #[error("unknown component: {0}")]
    UnknownComponent(String),

    #[error("unknown wire: {0}")]
    UnknownWire(String),

    #[error("{component} has no pin {pin}")]
    InvalidPin { component: String, pin: u8 },

    #[error("wire would connect {0} pin {1} to itself")]
    SelfLoop(String, u8),

    #[error("{0} still has connections, delete them first")]
    HasConnections(String),

    #[error("component name {0} is used more than once")]
    DuplicateName(String),

    #[error("unknown component kind: {0}")]
    UnknownKind(String),

    #[error(transparent)]
    Conflict(#[from] ConflictError),
}

// pprl-core/src/collaborators.rs
//
// Interface stubs for the systems this crate hands off to rather than
// implements: envelope encryption/KMS for protecting an embedder or
// embedded table at rest, and the transport that moves bytes between
// parties. Neither is implemented here; a caller wires in a concrete type
// around the command-line driver that owns party orchestration.

use crate::error::Result;

/// Wraps and unwraps a byte payload under a key a KMS or HSM manages.
/// A concrete implementation is expected to hold its own key material and
/// never accept it as a plain argument.
pub trait EnvelopeCipher {
    fn wrap(&self, plaintext: &[u8]) -> Result<Vec<u8>>;
    fn unwrap(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// Moves an already-encoded payload to or from a counterparty. Framing,
/// retries, and authentication are the implementation's responsibility;
/// this crate only ever hands it bytes produced by `serialize::to_bytes`
/// or a `serde_json`-encoded report.
pub trait Transport {
    fn send(&self, payload: &[u8]) -> Result<()>;
    fn receive(&self) -> Result<Vec<u8>>;
}

//! The narrow ABI capability [`crate::engine::MutationEngine::prolongate`]
//! needs — not a full ABI model (that introspection is out of scope; see
//! spec §1).

/// A single function-argument descriptor, as far as prolongation cares: only
/// its name is inspected, to detect (and strip) a trailing sentinel entry
/// with an empty name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    /// The function's name. An empty name marks a sentinel/fallback
    /// descriptor that prolongation must not duplicate.
    pub name: String,
}

impl FunctionDescriptor {
    /// Build a named descriptor.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The minimum ABI capability `prolongate` needs: a mutable ordered list of
/// function descriptors, and a mutable transaction-length counter.
///
/// Hosts implement this over their real ABI model; the engine only ever
/// doubles the descriptor list, inspects the last entry's name, and flips
/// the transaction length between 1 and 2 around a single oracle call.
pub trait AbiDescriptors {
    /// The function descriptors, in declaration order.
    fn descriptors(&self) -> &[FunctionDescriptor];

    /// Mutable access to the function descriptors.
    fn descriptors_mut(&mut self) -> &mut Vec<FunctionDescriptor>;

    /// The number of transactions this ABI currently describes.
    fn transaction_length(&self) -> u32;

    /// Set the number of transactions this ABI describes.
    fn set_transaction_length(&mut self, length: u32);
}

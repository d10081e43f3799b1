use serde::{Deserialize, Serialize};

/// Identifies an SSA value. Unique across a whole [`Module`](crate::Module) so that
/// serialized graphs never need per-function qualification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueId(pub u32);

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Identifies a declared memory object, the target of an `addr_of`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obj{}", self.0)
    }
}

/// Declared type of a value: plain data or an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Scalar,
    Pointer,
}

impl TypeTag {
    pub fn is_pointer(self) -> bool {
        matches!(self, TypeTag::Pointer)
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeTag::Scalar => write!(f, "scalar"),
            TypeTag::Pointer => write!(f, "ptr"),
        }
    }
}

/// A named, addressable memory object owned by a function (a stack slot the
/// front end has already lifted out of SSA form).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryObject {
    pub id: ObjectId,
    pub name: String,
}

impl MemoryObject {
    pub fn new(id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

//! Hardware types and the per-module type database.
//!
//! Each module owns its [`TypeDb`], so modules prepared on different threads
//! can intern new types (the storage type of a fresh wire, say) without
//! sharing mutable state.

use crate::ids::TypeId;
use serde::{Deserialize, Serialize};
use svprep_common::{Ident, Interner};

/// A hardware type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// A two's-complement bit vector (`i1`, `i8`, ...).
    Int {
        /// The number of bits.
        width: u32,
    },
    /// Mutable storage holding a value of the element type. Declarations
    /// produce storage; reads turn it back into a value.
    InOut {
        /// The stored type.
        element: TypeId,
    },
    /// A packed array.
    Array {
        /// The type of each element.
        element: TypeId,
        /// The number of elements.
        len: u32,
    },
    /// A packed struct.
    Struct {
        /// Named fields with their types, in declaration order.
        fields: Vec<(Ident, TypeId)>,
    },
}

/// Interned types for cheap comparison.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeDb {
    types: Vec<Type>,
}

impl TypeDb {
    /// Creates a new, empty type database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a type, returning its [`TypeId`]. Identical types share an ID.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(i) = self.types.iter().position(|existing| existing == &ty) {
            return TypeId::from_raw(i as u32);
        }
        let id = TypeId::from_raw(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Shorthand for interning an integer type.
    pub fn int(&mut self, width: u32) -> TypeId {
        self.intern(Type::Int { width })
    }

    /// Interns the storage type wrapping `element`.
    pub fn inout(&mut self, element: TypeId) -> TypeId {
        self.intern(Type::InOut { element })
    }

    /// Returns the type with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.as_raw() as usize]
    }

    /// Returns `true` for storage (`InOut`) types.
    pub fn is_inout(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::InOut { .. })
    }

    /// Returns the stored type of an `InOut`, or `None` for other types.
    pub fn inout_element(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            Type::InOut { element } => Some(*element),
            _ => None,
        }
    }

    /// Returns the fields of a struct type, or an empty slice otherwise.
    pub fn struct_fields(&self, id: TypeId) -> &[(Ident, TypeId)] {
        match self.get(id) {
            Type::Struct { fields } => fields,
            _ => &[],
        }
    }

    /// Returns the packed bit width of a value type; `None` for storage.
    pub fn bit_width(&self, id: TypeId) -> Option<u32> {
        match self.get(id) {
            Type::Int { width } => Some(*width),
            Type::Array { element, len } => self.bit_width(*element).map(|w| w * len),
            Type::Struct { fields } => fields
                .iter()
                .map(|(_, ty)| self.bit_width(*ty))
                .sum::<Option<u32>>(),
            Type::InOut { .. } => None,
        }
    }

    /// Renders a type the way the IR dump prints it (`i8`, `!inout<i8>`).
    pub fn display(&self, id: TypeId, interner: &Interner) -> String {
        match self.get(id) {
            Type::Int { width } => format!("i{width}"),
            Type::InOut { element } => format!("!inout<{}>", self.display(*element, interner)),
            Type::Array { element, len } => {
                format!("!array<{len}x{}>", self.display(*element, interner))
            }
            Type::Struct { fields } => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|(name, ty)| {
                        format!("{}: {}", interner.resolve(*name), self.display(*ty, interner))
                    })
                    .collect();
                format!("!struct<{}>", parts.join(", "))
            }
        }
    }

    /// Returns the number of interned types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types have been interned.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

//! Type-erased column cells.
//!
//! A [`ColumnHandle`] owns one boxed cell together with the `TypeId` of the
//! logical column type. The boxed value's drop glue is the type-specific
//! destroy routine; it is fixed when the handle is created and runs exactly
//! once, when the handle is dropped or [`ColumnHandle::destroy`] consumes it.
//!
//! Vector-like columns (`Vec<T>`, `BTreeMap<K, V>`) use an extra level of
//! indirection: the cell is `Option<Box<C>>`, so the collection can be
//! replaced or cleared every row while the cell itself stays put. Their
//! type tag is the collection type `C`, not the cell type.

use std::any::{Any, TypeId};

use crate::error::{Error, Result};
use crate::schema::{with_key_type, with_scalar_type, DataType};
use crate::typename::short_type_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Scalar,
    Vector,
}

/// Who fills the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOrigin {
    /// Delivered by the event source on every row.
    Source,
    /// Written by a registered pipeline function.
    Derived,
}

pub struct ColumnHandle {
    cell: Box<dyn Any>,
    type_id: TypeId,
    type_name: String,
    kind: ColumnKind,
    origin: ColumnOrigin,
}

impl std::fmt::Debug for ColumnHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnHandle")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("origin", &self.origin)
            .finish()
    }
}

impl ColumnHandle {
    /// Take ownership of a scalar cell of type `T`.
    pub fn attach<T: Any>(cell: Box<T>, origin: ColumnOrigin) -> Self {
        Self {
            cell,
            type_id: TypeId::of::<T>(),
            type_name: short_type_name::<T>(),
            kind: ColumnKind::Scalar,
            origin,
        }
    }

    /// Take ownership of a vector cell holding an optional collection `C`.
    pub fn attach_vector<C: Any>(cell: Box<Option<Box<C>>>, origin: ColumnOrigin) -> Self {
        Self {
            cell,
            type_id: TypeId::of::<C>(),
            type_name: short_type_name::<C>(),
            kind: ColumnKind::Vector,
            origin,
        }
    }

    /// Allocate an empty cell for a column a source declares as `data_type`.
    pub fn allocate(data_type: &DataType) -> Result<Self> {
        let origin = ColumnOrigin::Source;
        let handle = match *data_type {
            DataType::Scalar(t) => {
                with_scalar_type!(t, T => Self::attach(Box::<T>::default(), origin))
            }
            DataType::Vector(t) => with_scalar_type!(t, T => {
                Self::attach_vector::<Vec<T>>(Box::new(None), origin)
            }),
            DataType::Map(k, v) => with_key_type!(
                k,
                K => with_scalar_type!(v, V => {
                    Self::attach_vector::<std::collections::BTreeMap<K, V>>(Box::new(None), origin)
                }),
                return Err(Error::Source(format!("unsupported map key type {}", k)))
            ),
        };
        Ok(handle)
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn origin(&self) -> ColumnOrigin {
        self.origin
    }

    /// Exact type check against the logical column type.
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn scalar<T: Any>(&self) -> Option<&T> {
        match self.kind {
            ColumnKind::Scalar => self.cell.downcast_ref::<T>(),
            ColumnKind::Vector => None,
        }
    }

    pub fn scalar_mut<T: Any>(&mut self) -> Option<&mut T> {
        match self.kind {
            ColumnKind::Scalar => self.cell.downcast_mut::<T>(),
            ColumnKind::Vector => None,
        }
    }

    /// The collection currently held by a vector cell; `Some(None)` when empty.
    pub fn collection<C: Any>(&self) -> Option<Option<&C>> {
        match self.kind {
            ColumnKind::Vector => self
                .cell
                .downcast_ref::<Option<Box<C>>>()
                .map(|slot| slot.as_deref()),
            ColumnKind::Scalar => None,
        }
    }

    pub fn collection_slot<C: Any>(&mut self) -> Option<&mut Option<Box<C>>> {
        match self.kind {
            ColumnKind::Vector => self.cell.downcast_mut::<Option<Box<C>>>(),
            ColumnKind::Scalar => None,
        }
    }

    /// Raw cell, as handed to a source for filling.
    pub fn cell(&self) -> &dyn Any {
        self.cell.as_ref()
    }

    pub fn cell_mut(&mut self) -> &mut (dyn Any + 'static) {
        self.cell.as_mut()
    }

    /// Release the cell now. Consumes the handle, so it cannot run twice.
    pub fn destroy(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScalarType;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Tracked(Rc<Cell<usize>>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn scalar_handle_checks_type() {
        let h = ColumnHandle::attach(Box::new(3.5f32), ColumnOrigin::Source);
        assert!(h.is::<f32>());
        assert!(!h.is::<f64>());
        assert_eq!(h.scalar::<f32>(), Some(&3.5));
        assert_eq!(h.scalar::<f64>(), None);
        assert_eq!(h.type_name(), "f32");
    }

    #[test]
    fn vector_handle_tags_collection_type() {
        let h = ColumnHandle::attach_vector::<Vec<i32>>(
            Box::new(Some(Box::new(vec![1, 2]))),
            ColumnOrigin::Derived,
        );
        assert!(h.is::<Vec<i32>>());
        assert_eq!(h.kind(), ColumnKind::Vector);
        assert_eq!(h.collection::<Vec<i32>>(), Some(Some(&vec![1, 2])));
        assert!(h.scalar::<Vec<i32>>().is_none());
    }

    #[test]
    fn destroy_frees_collection_once() {
        let drops = Rc::new(Cell::new(0));
        let payload = vec![Tracked(drops.clone()), Tracked(drops.clone())];
        let h = ColumnHandle::attach_vector::<Vec<Tracked>>(
            Box::new(Some(Box::new(payload))),
            ColumnOrigin::Derived,
        );
        h.destroy();
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn empty_vector_cell_destroys_cleanly() {
        let h = ColumnHandle::allocate(&DataType::Vector(ScalarType::Float64)).unwrap();
        assert_eq!(h.collection::<Vec<f64>>(), Some(None));
        h.destroy();
    }
}

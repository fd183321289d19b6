//! Snapshots of node values and transactional rollback.

use itertools::izip;

use crate::{
    distribution::Distribution,
    index::Span,
    model::Model,
    node::NodeHandle,
    shape::Shape,
    subset::{Column, Element, Row, Subset},
};

/// Something whose values can be copied out and written back.
///
/// Implemented for whole nodes, elements, rows, columns and tuples of
/// those. Tuples back up member-wise and in order, so the snapshot of a
/// tuple is the tuple of member snapshots.
pub trait Backup: Copy {
    type Snapshot;

    fn backup(&self, model: &Model) -> Self::Snapshot;

    /// Overwrite the current values with a snapshot taken from the same
    /// target. Panics if the snapshot belongs to a different node or
    /// selection.
    fn restore(&self, model: &mut Model, snapshot: &Self::Snapshot);
}

/// Copied values of one subset, keyed to the node and span they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<V> {
    node: usize,
    span: Span,
    values: Vec<V>,
}

impl<V> Snapshot<V> {
    pub fn values(&self) -> &[V] {
        &self.values
    }
}

fn backup_subset<T: Subset>(target: &T, model: &Model) -> Snapshot<<T::Dist as Distribution>::Value> {
    let span = target.span(model);
    let values = model.node(target.handle()).values();
    Snapshot {
        node: target.node_id(),
        span,
        values: span.offsets().map(|offset| values[offset]).collect(),
    }
}

fn restore_subset<T: Subset>(target: &T, model: &mut Model, snapshot: &Snapshot<<T::Dist as Distribution>::Value>) {
    let span = target.span(model);
    assert_eq!(
        (snapshot.node, snapshot.span),
        (target.node_id(), span),
        "snapshot does not match the restored target"
    );
    assert_eq!(snapshot.values.len(), span.len());
    let values = model.node_mut(target.handle()).values_mut();
    for (offset, &value) in izip!(span.offsets(), &snapshot.values) {
        values[offset] = value;
    }
}

macro_rules! impl_backup {
    ($($target:ty => [$($bounds:tt)*]),* $(,)?) => {
        $(
            impl<$($bounds)*> Backup for $target {
                type Snapshot = Snapshot<D::Value>;

                fn backup(&self, model: &Model) -> Self::Snapshot {
                    backup_subset(self, model)
                }

                fn restore(&self, model: &mut Model, snapshot: &Self::Snapshot) {
                    restore_subset(self, model, snapshot)
                }
            }
        )*
    };
}

impl_backup!(
    NodeHandle<D, S> => [D: Distribution, S: Shape],
    Element<D, S> => [D: Distribution, S: Shape],
    Row<D> => [D: Distribution],
    Column<D> => [D: Distribution],
);

macro_rules! impl_backup_tuple {
    ($($member:ident $idx:tt),+) => {
        impl<$($member: Backup),+> Backup for ($($member,)+) {
            type Snapshot = ($($member::Snapshot,)+);

            fn backup(&self, model: &Model) -> Self::Snapshot {
                ($(self.$idx.backup(model),)+)
            }

            fn restore(&self, model: &mut Model, snapshot: &Self::Snapshot) {
                $(self.$idx.restore(model, &snapshot.$idx);)+
            }
        }
    };
}

impl_backup_tuple!(A 0);
impl_backup_tuple!(A 0, B 1);
impl_backup_tuple!(A 0, B 1, C 2);
impl_backup_tuple!(A 0, B 1, C 2, E 3);
impl_backup_tuple!(A 0, B 1, C 2, E 3, F 4);
impl_backup_tuple!(A 0, B 1, C 2, E 3, F 4, G 5);

/// A scoped proposal.
///
/// The target is backed up when the transaction begins. Unless
/// [`Transaction::commit`] is called, the backup is restored when the
/// transaction ends, including on early return or unwinding, so a
/// half-evaluated proposal never survives the scope that made it.
pub struct Transaction<'m, T: Backup> {
    model: &'m mut Model,
    target: T,
    snapshot: Option<T::Snapshot>,
}

impl<'m, T: Backup> Transaction<'m, T> {
    pub fn begin(model: &'m mut Model, target: T) -> Self {
        let snapshot = target.backup(model);
        Transaction {
            model,
            target,
            snapshot: Some(snapshot),
        }
    }

    pub fn model(&self) -> &Model {
        &*self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut *self.model
    }

    pub fn target(&self) -> T {
        self.target
    }

    /// Keep the current values and discard the backup.
    pub fn commit(mut self) {
        self.snapshot = None;
    }

    /// Restore the backed up values.
    pub fn rollback(self) {}
}

impl<T: Backup> Drop for Transaction<'_, T> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.target.restore(&mut *self.model, &snapshot);
        }
    }
}

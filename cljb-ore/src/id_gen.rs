//! ID generator utilities.

/// Hands out monotonically increasing IDs of type `Id`.
///
/// Every registry in the build graph owns one of these so IDs are never reused within a single
/// configuration pass.
#[derive(Debug)]
pub struct Gen<Id> {
    next: u64,
    phantom: std::marker::PhantomData<fn() -> Id>,
}

impl<Id> Default for Gen<Id> {
    fn default() -> Self {
        Gen {
            next: 0,
            phantom: std::marker::PhantomData,
        }
    }
}

impl<Id: From<u64>> Gen<Id> {
    /// Allocate the next ID.
    pub fn next(&mut self) -> Id {
        let id = self.next;
        self.next = id.checked_add(1).expect("ID allocator overflowed u64");
        Id::from(id)
    }
}

#[cfg(test)]
mod tests {
    use super::Gen;

    #[derive(Debug, PartialEq, Eq)]
    struct TaskId(u64);

    impl From<u64> for TaskId {
        fn from(value: u64) -> Self {
            TaskId(value)
        }
    }

    #[test]
    fn ids_increase() {
        let mut ids: Gen<TaskId> = Gen::default();
        assert_eq!(ids.next(), TaskId(0));
        assert_eq!(ids.next(), TaskId(1));
    }
}

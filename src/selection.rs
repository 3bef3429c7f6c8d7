use crate::Record;

/// Somewhere to park the course one screen wants to hand to the next.
///
/// Nothing here is validated or persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseSelection {
    current: Option<Record>,
}

impl CourseSelection {
    pub fn new() -> Self { CourseSelection::default() }

    pub fn set_current_course(&mut self, course: Record) {
        self.current = Some(course);
    }

    pub fn clear_current_course(&mut self) { self.current = None; }

    pub fn current_course(&self) -> Option<&Record> { self.current.as_ref() }

    /// Hand the selection over, leaving nothing behind.
    pub fn take_current_course(&mut self) -> Option<Record> {
        self.current.take()
    }
}

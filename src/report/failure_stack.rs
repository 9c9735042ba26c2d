//! Failure-stack reconstruction: maps a runtime failure back to the line
//! range of the failing action in the serialized test definition.
//!
//! The reconstructor re-parses the XML test definition with a streaming
//! reader while mirroring the executed container structure in an explicit
//! frame stack. Each frame holds the remaining siblings up to and including
//! the container's active child, reversed so pop order matches execution
//! order. A matched sibling that is itself a container gets its children
//! pushed so the walk consumes the nested subtree element by element, which
//! also means a nested element sharing the name of the next expected sibling
//! can be misattributed. That short-name collision is a long-standing
//! behavior test suites rely on; it stays.
//!
//! Reconstruction is best-effort diagnostics: an unresolvable source file
//! yields an empty stack, never an error.

use std::fmt;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::actions::TestAction;
use crate::container::TestActionContainer;
use crate::testcase::TestCase;

/// One frame of the reconstructed stack: where in the test definition a
/// member of the failing action chain starts (and, for the innermost entry,
/// ends).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureStackElement {
    pub test_file_path: String,
    pub action_name: String,
    pub line_start: u64,
    pub line_end: Option<u64>,
}

impl FailureStackElement {
    pub fn new(test_file_path: impl Into<String>, action_name: impl Into<String>, line_start: u64) -> Self {
        Self {
            test_file_path: test_file_path.into(),
            action_name: action_name.into(),
            line_start,
            line_end: None,
        }
    }

    /// Marker entry for failures raised before the first action started.
    pub fn init(test_file_path: impl Into<String>) -> Self {
        Self::new(test_file_path, "init", 0)
    }

    /// Human-readable stack line, e.g. `at com/acme/OrderTest(receive:13-17)`.
    pub fn stack_message(&self) -> String {
        match self.line_end {
            Some(end) if end != self.line_start => format!(
                "at {}({}:{}-{})",
                self.test_file_path, self.action_name, self.line_start, end
            ),
            _ => format!(
                "at {}({}:{})",
                self.test_file_path, self.action_name, self.line_start
            ),
        }
    }
}

impl fmt::Display for FailureStackElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stack_message())
    }
}

/// Reconstructs the failure stack for a failed test case, reading the test
/// definition `<package path>/<TestName>.xml` below `source_root`.
pub fn failure_stack(test: &TestCase, source_root: &Path) -> Vec<FailureStackElement> {
    let relative = format!(
        "{}/{}",
        test.package_name().replace('.', "/"),
        test.name()
    );

    let Some(file) = locate_source_file(test, source_root) else {
        debug!(test = %test.qualified_name(), "no test definition source found, skipping failure stack");
        return Vec::new();
    };
    let source = match std::fs::read_to_string(&file) {
        Ok(source) => source,
        Err(e) => {
            warn!(file = %file.display(), error = %e, "failed to read test definition source");
            return Vec::new();
        }
    };

    if test.active_index().is_none() {
        // The failure happened before any action started (setup, variable
        // initialization).
        return vec![FailureStackElement::init(relative)];
    }

    reconstruct(&source, test, &relative)
}

fn locate_source_file(test: &TestCase, source_root: &Path) -> Option<PathBuf> {
    let file_name = format!("{}.xml", test.name());
    let direct = source_root
        .join(test.package_name().replace('.', "/"))
        .join(&file_name);
    if direct.is_file() {
        return Some(direct);
    }

    // Fallback: search the tree for a file with the test's name.
    WalkDir::new(source_root)
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| {
            entry.file_type().is_file() && entry.file_name().to_string_lossy() == file_name
        })
        .map(|entry| entry.into_path())
}

/// Mirrors one container level: the remaining siblings of the failing chain,
/// reversed so `pop` yields them in execution order.
struct StackFinder<'a> {
    stack: Vec<&'a dyn TestAction>,
    current: Option<&'a dyn TestAction>,
}

impl<'a> StackFinder<'a> {
    fn seed(container: &'a dyn TestActionContainer) -> Option<Self> {
        let active = container.active_index()?;
        let actions = container.actions();
        let mut stack = Vec::with_capacity(active + 1);
        for index in (0..=active).rev() {
            stack.push(actions[index].as_ref());
        }
        Some(Self {
            stack,
            current: None,
        })
    }

    /// Advances the mirror for one start tag. Returns `true` when the tag
    /// belongs to the chain's action at this level; the caller then records
    /// a stack element and either descends or switches to end-tag search.
    fn handle_start(&mut self, tag_name: &str) -> bool {
        if self.current.is_none() {
            self.current = self.stack.pop();
        }
        let Some(action) = self.current else {
            return false;
        };

        if tag_name == action.name() {
            if self.stack.is_empty() {
                // Reached the active action at this level.
                return true;
            }
            if let Some(container) = action.as_container() {
                // A sibling container on the way to the target: push its
                // children so the walk consumes the whole subtree.
                for child in container.actions().iter().rev() {
                    self.stack.push(child.as_ref());
                }
            }
            self.current = None;
        }
        false
    }

    /// The matched target, when it is a container with an active child to
    /// descend into.
    fn nested_container(&self) -> Option<&'a dyn TestActionContainer> {
        let container = self.current?.as_container()?;
        container.active_index().map(|_| container)
    }
}

fn reconstruct(source: &str, test: &TestCase, path: &str) -> Vec<FailureStackElement> {
    let mut elements: Vec<FailureStackElement> = Vec::new();
    let mut finder = StackFinder::seed(test as &dyn TestActionContainer);
    let mut pending_end: Option<String> = None;

    let mut reader = Reader::from_str(source);
    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "test definition source is not well-formed, aborting failure stack");
                return Vec::new();
            }
        };
        let line = line_at(source, reader.buffer_position() as usize);
        let is_empty_tag = matches!(&event, Event::Empty(_));

        match &event {
            Event::Start(start) | Event::Empty(start) => {
                let tag_name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

                let mut target: Option<Option<&dyn TestActionContainer>> = None;
                if let Some(active) = finder.as_mut() {
                    if active.handle_start(&tag_name) {
                        target = Some(active.nested_container());
                    }
                }
                if let Some(nested) = target {
                    elements.push(FailureStackElement::new(path, &tag_name, line));
                    match nested {
                        // Descend: mirror the nested container next.
                        Some(container) => finder = StackFinder::seed(container),
                        None => {
                            finder = None;
                            pending_end = Some(tag_name.clone());
                        }
                    }
                }

                // Self-closing tags end on the same line they start.
                if is_empty_tag {
                    close_pending(&mut elements, &mut pending_end, &tag_name, line);
                }
            }
            Event::End(end) => {
                let tag_name = String::from_utf8_lossy(end.local_name().as_ref()).into_owned();
                close_pending(&mut elements, &mut pending_end, &tag_name, line);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    elements
}

fn close_pending(
    elements: &mut [FailureStackElement],
    pending_end: &mut Option<String>,
    tag_name: &str,
    line: u64,
) {
    if pending_end.as_deref() == Some(tag_name) {
        if let Some(last) = elements.last_mut() {
            last.line_end = Some(line);
        }
        *pending_end = None;
    }
}

/// 1-based line number of the byte offset `position` (the position just past
/// the `>` of the event that was read).
fn line_at(source: &str, position: usize) -> u64 {
    let clamped = position.min(source.len());
    source[..clamped].bytes().filter(|b| *b == b'\n').count() as u64 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_message_renders_with_and_without_end_line() {
        let mut element = FailureStackElement::new("com/acme/T", "receive", 13);
        assert_eq!(element.stack_message(), "at com/acme/T(receive:13)");
        element.line_end = Some(13);
        assert_eq!(element.stack_message(), "at com/acme/T(receive:13)");
        element.line_end = Some(17);
        assert_eq!(element.stack_message(), "at com/acme/T(receive:13-17)");
    }

    #[test]
    fn line_numbers_are_one_based() {
        let source = "a\nb\nc";
        assert_eq!(line_at(source, 0), 1);
        assert_eq!(line_at(source, 2), 2);
        assert_eq!(line_at(source, 4), 3);
        assert_eq!(line_at(source, 400), 3);
    }
}

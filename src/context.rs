/// Names of the currently open elements, outermost first.
#[derive(Debug, Default)]
pub struct ContextStack {
    path: Vec<String>,
}

impl ContextStack {
    pub fn push(&mut self, name: &str) {
        self.path.push(name.to_string());
    }

    /// Closes the innermost element. Returns `None` when nothing is open.
    pub fn pop(&mut self) -> Option<String> {
        self.path.pop()
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn top(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Renders the path as `dblp/article/title` for diagnostics.
    pub fn path(&self) -> String {
        self.path.join("/")
    }
}

/// Character data of the open elements, one buffer per nesting level.
///
/// Fragments are appended untouched in arrival order. Closing a level hands
/// back everything collected for it, so text of one element never reaches a
/// sibling.
#[derive(Debug, Default)]
pub struct TextAccumulator {
    buffers: Vec<String>,
}

impl TextAccumulator {
    pub fn open(&mut self) {
        self.buffers.push(String::new());
    }

    /// Appends to the innermost buffer. Text outside any element is dropped.
    pub fn append(&mut self, fragment: &str) {
        if let Some(buffer) = self.buffers.last_mut() {
            buffer.push_str(fragment);
        }
    }

    pub fn close(&mut self) -> String {
        self.buffers.pop().unwrap_or_default()
    }
}

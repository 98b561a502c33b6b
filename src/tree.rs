/// Paths beyond this many are left out of the rendering (not the analysis).
pub const MAX_RENDERED_PATHS: usize = 150;

#[derive(Debug, Default)]
struct TreeNode {
    // Insertion-ordered children.
    children: Vec<(String, TreeNode)>,
}

impl TreeNode {
    fn child(&mut self, name: &str) -> &mut TreeNode {
        let index = match self.children.iter().position(|(existing, _)| existing == name) {
            Some(index) => index,
            None => {
                self.children.push((name.to_string(), TreeNode::default()));
                self.children.len() - 1
            }
        };
        &mut self.children[index].1
    }

    fn render_into(&self, prefix: &str, out: &mut String) {
        let count = self.children.len();
        for (i, (name, node)) in self.children.iter().enumerate() {
            let is_last = i + 1 == count;
            out.push_str(prefix);
            out.push_str(if is_last { "└── " } else { "├── " });
            out.push_str(name);
            out.push('\n');
            if !node.children.is_empty() {
                let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
                node.render_into(&child_prefix, out);
            }
        }
    }
}

/// Renders slash-delimited paths as an ASCII tree rooted at `/`.
#[derive(Debug, Clone)]
pub struct FileTreeRenderer {
    max_paths: usize,
}

impl Default for FileTreeRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl FileTreeRenderer {
    pub fn new() -> Self {
        Self {
            max_paths: MAX_RENDERED_PATHS,
        }
    }

    pub fn with_max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = max_paths;
        self
    }

    pub fn render<S: AsRef<str>>(&self, paths: &[S]) -> String {
        let mut root = TreeNode::default();
        for path in paths.iter().take(self.max_paths) {
            let mut current = &mut root;
            for part in path.as_ref().split('/') {
                current = current.child(part);
            }
        }

        let mut out = String::from("/\n");
        root.render_into("", &mut out);
        out
    }
}

use std::collections::BTreeMap;

/// Class id to display name mapping.
///
/// Exported YOLO models carry their names as a metadata string shaped like a
/// Python dict literal: `{0: 'person', 1: 'bicycle'}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassNames {
    names: BTreeMap<u32, String>,
}

impl ClassNames {
    pub fn parse(raw: &str) -> Self {
        let body = raw.trim().trim_start_matches('{').trim_end_matches('}');

        let names = body
            .split(',')
            .filter_map(|entry| {
                let (id, name) = entry.split_once(':')?;
                let id = id.trim().parse::<u32>().ok()?;
                let name = name.trim().trim_matches(|c| c == '\'' || c == '"');
                (!name.is_empty()).then(|| (id, name.to_string()))
            })
            .collect();

        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name for `class_id`, or `class <id>` when the model did not name it.
    pub fn label(&self, class_id: u32) -> String {
        self.names
            .get(&class_id)
            .cloned()
            .unwrap_or_else(|| format!("class {class_id}"))
    }
}

impl<S: Into<String>> FromIterator<S> for ClassNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let names = iter
            .into_iter()
            .enumerate()
            .map(|(id, name)| (id as u32, name.into()))
            .collect();
        Self { names }
    }
}

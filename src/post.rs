use serde::{Deserialize, Serialize};

/// A single Pinboard bookmark as returned by `posts/all` and `posts/get`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Post {
    pub(crate) href: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) extended: String,
    #[serde(default)]
    pub(crate) tags: Tags,
    #[serde(default)]
    pub(crate) time: String,
    #[serde(default)]
    pub(crate) shared: String,
    #[serde(default)]
    pub(crate) toread: String,
}

impl Post {
    pub(crate) fn is_unread(&self) -> bool {
        self.toread == "yes"
    }

    /// Copy of the post with the unread flag cleared and every other field kept.
    pub(crate) fn marked_read(&self) -> Post {
        Post {
            toread: "no".to_string(),
            ..self.clone()
        }
    }

    pub(crate) fn year(&self) -> Option<&str> {
        self.time.get(..4)
    }

    pub(crate) fn has_tag(&self, tag: &str) -> bool {
        self.tags.words().any(|t| t == tag)
    }
}

/// `posts/all` sends tags as one space-separated string; older exports use a list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub(crate) enum Tags {
    Text(String),
    List(Vec<String>),
}

impl Default for Tags {
    fn default() -> Self {
        Tags::Text(String::new())
    }
}

impl Tags {
    pub(crate) fn words(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Tags::Text(text) => Box::new(text.split_whitespace()),
            Tags::List(list) => Box::new(
                list.iter()
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty()),
            ),
        }
    }

    /// Wire form expected by `posts/add`.
    pub(crate) fn joined(&self) -> String {
        self.words().collect::<Vec<_>>().join(" ")
    }
}

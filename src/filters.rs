use std::collections::BTreeSet;

use crate::post::Post;

pub(crate) const DEFAULT_LIMIT: usize = 100;

#[derive(Debug)]
pub(crate) enum Predicate {
    /// Any of the substrings appears in the bookmark URL.
    Domain(&'static [&'static str]),
    Tag(&'static str),
}

#[derive(Debug)]
pub(crate) struct Filter {
    pub(crate) path: &'static str,
    pub(crate) label: &'static str,
    predicate: Predicate,
}

impl Filter {
    pub(crate) fn matches(&self, post: &Post) -> bool {
        match self.predicate {
            Predicate::Domain(domains) => domains.iter().any(|d| post.href.contains(d)),
            Predicate::Tag(tag) => post.has_tag(tag),
        }
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Filter {}

pub(crate) static FILTERS: &[Filter] = &[
    Filter {
        path: "/github",
        label: "GitHub",
        predicate: Predicate::Domain(&["github.com"]),
    },
    Filter {
        path: "/youtube",
        label: "YouTube",
        predicate: Predicate::Domain(&["youtube.com", "youtu.be"]),
    },
    Filter {
        path: "/twitter",
        label: "Twitter",
        predicate: Predicate::Domain(&["twitter.com", "//x.com/"]),
    },
    Filter {
        path: "/hn",
        label: "Hacker News",
        predicate: Predicate::Domain(&["news.ycombinator.com"]),
    },
    Filter {
        path: "/wikipedia",
        label: "Wikipedia",
        predicate: Predicate::Domain(&["wikipedia.org"]),
    },
    Filter {
        path: "/papers",
        label: "Papers",
        predicate: Predicate::Domain(&["arxiv.org", ".pdf"]),
    },
    Filter {
        path: "/videos",
        label: "Videos",
        predicate: Predicate::Tag("video"),
    },
    Filter {
        path: "/podcasts",
        label: "Podcasts",
        predicate: Predicate::Tag("podcast"),
    },
];

/// Which predicate a request path selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Selection<'a> {
    All,
    Named(&'static Filter),
    Year(&'a str),
}

impl<'a> Selection<'a> {
    /// Named filters win; otherwise `/YYYY` selects a year; anything else shows everything.
    pub(crate) fn for_path(path: &'a str) -> Selection<'a> {
        if let Some(filter) = FILTERS.iter().find(|f| f.path == path) {
            return Selection::Named(filter);
        }
        match year_in_path(path) {
            Some(year) => Selection::Year(year),
            None => Selection::All,
        }
    }

    pub(crate) fn matches(&self, post: &Post) -> bool {
        match self {
            Selection::All => true,
            Selection::Named(filter) => filter.matches(post),
            Selection::Year(year) => post.time.starts_with(*year),
        }
    }
}

fn year_in_path(path: &str) -> Option<&str> {
    let year = path.strip_prefix('/')?;
    if year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()) {
        Some(year)
    } else {
        None
    }
}

#[derive(Debug)]
pub(crate) struct Listing<'a> {
    pub(crate) selection: Selection<'a>,
    /// At most `limit` posts, oldest first.
    pub(crate) shown: Vec<Post>,
    pub(crate) total: usize,
    /// Named filters with at least one unread match.
    pub(crate) filters: Vec<&'static Filter>,
    /// Years present in the filtered set, ascending.
    pub(crate) years: Vec<String>,
}

/// Unread posts in ascending `time` order. Plain string order relies on the
/// fixed-width timestamps Pinboard sends.
pub(crate) fn unread_sorted(posts: Vec<Post>) -> Vec<Post> {
    let mut unread: Vec<Post> = posts.into_iter().filter(|p| p.is_unread()).collect();
    unread.sort_by(|a, b| a.time.cmp(&b.time));
    unread
}

pub(crate) fn query(posts: Vec<Post>, path: &str, limit: usize) -> Listing<'_> {
    let unread = unread_sorted(posts);
    let filters: Vec<&'static Filter> = FILTERS
        .iter()
        .filter(|f| unread.iter().any(|p| f.matches(p)))
        .collect();

    let selection = Selection::for_path(path);
    let matching: Vec<Post> = unread.into_iter().filter(|p| selection.matches(p)).collect();

    let years: Vec<String> = matching
        .iter()
        .filter_map(|p| p.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|y| y.to_string())
        .collect();

    let total = matching.len();
    let shown = matching.into_iter().take(limit).collect();

    Listing {
        selection,
        shown,
        total,
        filters,
        years,
    }
}

/// Reads `?limit=`; anything that is not a non-negative integer falls back to the default.
pub(crate) fn parse_limit(raw: Option<&str>) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_LIMIT)
}

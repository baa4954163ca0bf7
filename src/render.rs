use anyhow::{Context, Result};
use askama::Template;

use crate::filters::{Listing, Selection};
use crate::post::Post;

pub(crate) struct NavLink {
    pub(crate) href: String,
    pub(crate) label: String,
    pub(crate) active: bool,
}

pub(crate) struct PostView<'a> {
    pub(crate) href: &'a str,
    pub(crate) description: &'a str,
    pub(crate) extended: &'a str,
    pub(crate) tags: String,
    pub(crate) time: &'a str,
}

#[derive(Template)]
#[template(path = "page.html")]
pub(crate) struct Page<'a> {
    pub(crate) title: &'a str,
    pub(crate) filters: Vec<NavLink>,
    pub(crate) years: Vec<NavLink>,
    pub(crate) shown: usize,
    pub(crate) total: usize,
    pub(crate) posts: Vec<PostView<'a>>,
}

impl<'a> Page<'a> {
    pub(crate) fn new(title: &'a str, listing: &'a Listing<'_>) -> Self {
        let mut filters = vec![NavLink {
            href: "/".to_string(),
            label: "All".to_string(),
            active: listing.selection == Selection::All,
        }];
        filters.extend(listing.filters.iter().map(|f| NavLink {
            href: f.path.to_string(),
            label: f.label.to_string(),
            active: listing.selection == Selection::Named(*f),
        }));

        let years = listing
            .years
            .iter()
            .map(|year| NavLink {
                href: format!("/{}", year),
                label: year.clone(),
                active: listing.selection == Selection::Year(year.as_str()),
            })
            .collect();

        Page {
            title,
            filters,
            years,
            shown: listing.shown.len(),
            total: listing.total,
            posts: listing.shown.iter().map(PostView::from).collect(),
        }
    }
}

impl<'a> From<&'a Post> for PostView<'a> {
    fn from(post: &'a Post) -> Self {
        PostView {
            href: &post.href,
            description: &post.description,
            extended: &post.extended,
            tags: post.tags.joined(),
            time: &post.time,
        }
    }
}

/// Renders the listing as a complete HTML document. Every interpolated value is escaped.
pub(crate) fn render_page(title: &str, listing: &Listing<'_>) -> Result<String> {
    Page::new(title, listing).render().context("render page")
}

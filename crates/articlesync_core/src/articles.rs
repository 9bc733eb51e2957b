use std::path::{Path, PathBuf};

use tracing::debug;

use crate::api::{ApiResponse, ItemApi, TOTAL_COUNT_HEADER};
use crate::article::Article;
use crate::error::{Error, Result};
use crate::workspace::{Workspace, sub_domain};

pub const LIST_PATH: &str = "/authenticated_user/items";
pub const PER_PAGE: usize = 100;

/// Ordered collection of articles, as listed by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleList(Vec<Article>);

impl ArticleList {
    pub fn new(articles: Vec<Article>) -> Self {
        Self(articles)
    }

    /// Page through the authenticated user's items in `workspace`. The first
    /// page's total count fixes how many pages are requested.
    pub fn fetch<A: ItemApi + ?Sized>(api: &mut A, workspace: Option<&Workspace>) -> Result<Self> {
        let first = fetch_page(api, workspace, 1)?;
        let total = total_count(&first)?;
        let pages = total.div_ceil(PER_PAGE);
        let mut articles = decode_page(&first, workspace)?;
        debug!(page = 1, pages, total, received = articles.len(), "fetched listing page");

        for page in 2..=pages {
            let response = fetch_page(api, workspace, page)?;
            let items = decode_page(&response, workspace)?;
            debug!(page, pages, received = items.len(), "fetched listing page");
            articles.extend(items);
        }

        if articles.len() != total {
            return Err(Error::TotalCountMismatch {
                expected: total,
                actual: articles.len(),
            });
        }
        debug!(
            workspace = sub_domain(workspace).unwrap_or("personal"),
            count = articles.len(),
            "fetched articles"
        );
        Ok(Self(articles))
    }

    /// Save every article in order, stopping at the first failure.
    pub fn save(&mut self, root: &Path) -> Result<Vec<PathBuf>> {
        self.0.iter_mut().map(|article| article.save(root)).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Article> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Article] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Article> {
        self.0
    }
}

impl From<Vec<Article>> for ArticleList {
    fn from(articles: Vec<Article>) -> Self {
        Self(articles)
    }
}

impl Extend<Article> for ArticleList {
    fn extend<I: IntoIterator<Item = Article>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for ArticleList {
    type Item = Article;
    type IntoIter = std::vec::IntoIter<Article>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ArticleList {
    type Item = &'a Article;
    type IntoIter = std::slice::Iter<'a, Article>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn fetch_page<A: ItemApi + ?Sized>(
    api: &mut A,
    workspace: Option<&Workspace>,
    page: usize,
) -> Result<ApiResponse> {
    let path = format!("{LIST_PATH}?page={page}&per_page={PER_PAGE}");
    api.get(sub_domain(workspace), &path)?.ensure_success()
}

fn decode_page(response: &ApiResponse, workspace: Option<&Workspace>) -> Result<Vec<Article>> {
    let items: Vec<Article> = serde_json::from_slice(&response.body)?;
    Ok(items
        .into_iter()
        .map(|mut article| {
            article.workspace = workspace.cloned();
            article
        })
        .collect())
}

fn total_count(response: &ApiResponse) -> Result<usize> {
    let raw = response.header(TOTAL_COUNT_HEADER);
    raw.and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| Error::InvalidTotalCount(raw.map(ToString::to_string)))
}

use std::fs;
use std::path::Path;

use articlesync_core::{Article, ArticleList, Tag, Timestamp, Workspace};
use similar::TextDiff;
use tempfile::tempdir;

fn assert_same_text(expected: &str, actual: &str) {
    if expected != actual {
        let diff = TextDiff::from_lines(expected, actual)
            .unified_diff()
            .header("expected", "actual")
            .to_string();
        panic!("content mismatch:\n{diff}");
    }
}

#[test]
fn saved_article_loads_back_and_resaves_identically() {
    let temp = tempdir().expect("tempdir");
    let created_at = Timestamp::parse("2016-02-01T14:21:49+09:00").expect("timestamp");
    let mut article = Article::new(
        "Example Title",
        Some(created_at),
        Some(Workspace::new("increments", "Increments Inc")),
    );
    article.body = "## Sub title\n\nParagraph".to_string();
    article.tags.push(Tag::with_versions("Go", ["1.4.3", "1.5.3"]));
    article.tags.push(Tag::new("Docker"));

    let written = article.save(temp.path()).expect("save");
    assert_eq!(
        written,
        temp.path().join("increments/2016/02/01/Example Title.md")
    );
    let first = fs::read_to_string(&written).expect("read");

    let relative = article.path.clone().expect("path set by save");
    let mut loaded = Article::load(temp.path(), &relative).expect("load");
    assert_eq!(loaded.title, article.title);
    assert_eq!(loaded.body, article.body);
    assert_eq!(loaded.tags, article.tags);
    assert_eq!(loaded.workspace, article.workspace);
    assert_eq!(loaded.created_at, article.created_at);

    let rewritten = loaded.save(temp.path()).expect("re-save");
    assert_eq!(rewritten, written);
    assert_same_text(&first, &fs::read_to_string(&rewritten).expect("read again"));
}

#[test]
fn hand_written_legacy_file_is_normalised_on_save() {
    let temp = tempdir().expect("tempdir");
    let relative = Path::new("drafts/legacy.md");
    fs::create_dir_all(temp.path().join("drafts")).expect("create dir");
    fs::write(
        temp.path().join(relative),
        "<!--
id: abcdefghijklmnopqrst
url: http://example.com/mypost
created_at: 2013-12-10T12:29:14+09:00
updated_at: 2015-02-25T09:26:30+09:00
private: true
coediting: false
tags:
  TypeScript:
  Docker:
    - 1.9.2
-->
# Main title
## Sub title
Paragraph
",
    )
    .expect("write legacy file");

    let mut article = Article::load(temp.path(), relative).expect("load");
    article.save(temp.path()).expect("save");

    let expected = "<!--
id: abcdefghijklmnopqrst
url: http://example.com/mypost
created_at: 2013-12-10T12:29:14+09:00
updated_at: 2015-02-25T09:26:30+09:00
private: true
coediting: false
tags:
- TypeScript
- Docker:
  - 1.9.2
team: null
-->

# Main title

## Sub title
Paragraph
";
    let actual = fs::read_to_string(temp.path().join(relative)).expect("read");
    assert_same_text(expected, &actual);
}

#[test]
fn bulk_save_keeps_distinct_files_for_shared_titles() {
    let temp = tempdir().expect("tempdir");
    let created_at = Timestamp::parse("2015-11-28T22:02:37+09:00").expect("timestamp");
    let mut articles = ArticleList::new(vec![
        Article::new("Same Title", Some(created_at), None),
        Article::new("Same Title", Some(created_at), None),
    ]);

    let written = articles.save(temp.path()).expect("save");
    assert_eq!(
        written,
        vec![
            temp.path().join("mine/2015/11/28/Same Title.md"),
            temp.path().join("mine/2015/11/28/Same Title-.md"),
        ]
    );

    let again = articles.save(temp.path()).expect("save again");
    assert_eq!(again, written);
}

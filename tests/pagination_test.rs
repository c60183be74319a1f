//! Integration tests: paginated queries over a migrated SQLite database.

use rusqlite::types::Value;
use sqlkit::db::{crud, init_memory_pool, DbPool, Order};
use sqlkit::paginate::PageMeta;
use sqlkit::{Migration, Migrator, Model, PageLink, PageRequest, Paginator};

#[derive(Debug, Clone, PartialEq)]
struct Article {
    id: Option<i64>,
    title: String,
    views: i64,
}

impl Model for Article {
    const TABLE: &'static str = "articles";
    const COLUMNS: &'static [&'static str] = &["title", "views"];

    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            views: row.get(2)?,
        })
    }

    fn values(&self) -> Vec<Value> {
        vec![Value::Text(self.title.clone()), Value::Integer(self.views)]
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }
}

fn setup(rows: i64) -> DbPool {
    let pool = init_memory_pool().unwrap();
    let conn = pool.get().unwrap();
    let migrator = Migrator::new(vec![Migration::new(
        1,
        "create_articles",
        "CREATE TABLE articles (id INTEGER PRIMARY KEY, title TEXT NOT NULL, views INTEGER NOT NULL);",
    )])
    .unwrap();
    migrator.upgrade(&conn, None).unwrap();

    let articles: Vec<Article> = (1..=rows)
        .map(|i| Article {
            id: None,
            title: format!("article {i:03}"),
            views: i * 10,
        })
        .collect();
    crud::bulk_insert(&conn, &articles).unwrap();
    drop(conn);
    pool
}

#[test]
fn test_query_pages_through_table() {
    let pool = setup(490);
    let conn = pool.get().unwrap();

    let page = Article::query(&conn)
        .paginate(PageRequest::new(10, 20))
        .unwrap();
    assert_eq!(page.total(), 490);
    assert_eq!(page.pages(), 25);
    assert_eq!(page.pages_range(), Some((180, 199)));
    assert_eq!(page.len(), 20);
    assert_eq!(page.items()[0].title, "article 181");
    assert_eq!(page.items()[19].title, "article 200");
    assert_eq!(page.prev_num(), Some(9));
    assert_eq!(page.next_num(), Some(11));

    let first = Article::query(&conn)
        .paginate(PageRequest::new(1, 20))
        .unwrap();
    assert_eq!(first.pages_range(), Some((0, 19)));
    assert_eq!(first.items()[0].title, "article 001");
}

#[test]
fn test_last_page_is_partial() {
    let pool = setup(45);
    let conn = pool.get().unwrap();

    let page = Article::query(&conn)
        .paginate(PageRequest::new(3, 20))
        .unwrap();
    assert_eq!(page.len(), 5);
    assert!(page.has_prev());
    assert!(!page.has_next());
    assert_eq!(page.next_num(), None);
}

#[test]
fn test_page_past_end_is_empty() {
    let pool = setup(45);
    let conn = pool.get().unwrap();

    let page = Article::query(&conn)
        .paginate(PageRequest::new(9, 20))
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.total(), 45);
    assert_eq!(page.pages(), 3);
}

#[test]
fn test_filtered_ordered_query() {
    let pool = setup(100);
    let conn = pool.get().unwrap();

    let query = Article::query(&conn)
        .filter_cmp("views", sqlkit::db::Cmp::Gt, 500)
        .order_by("views", Order::Desc);
    let page = query.paginate(PageRequest::new(1, 10)).unwrap();
    assert_eq!(page.total(), 50);
    assert_eq!(page.items()[0].views, 1000);
    assert_eq!(page.items()[9].views, 910);

    // reuse the resolved total for the next page
    let next = page.to_page(&query, 2).unwrap();
    assert_eq!(next.total(), 50);
    assert_eq!(next.items()[0].views, 900);
}

#[test]
fn test_padding_and_callback() {
    let pool = setup(30);
    let conn = pool.get().unwrap();
    let query = Article::query(&conn);

    let page = Paginator::with_callback(
        &query,
        PageRequest::new(2, 10).padding(2),
        |mut a: Article| {
            a.title = a.title.to_uppercase();
            a
        },
    )
    .unwrap();
    // padded window spans 9..=22
    assert_eq!(page.len(), 14);
    assert_eq!(page.items()[0].title, "ARTICLE 009");
    assert_eq!(page.items()[13].title, "ARTICLE 022");
}

#[test]
fn test_unknown_column_surfaces_at_construction() {
    let pool = setup(5);
    let conn = pool.get().unwrap();

    let result = Article::query(&conn)
        .order_by("missing", Order::Asc)
        .paginate(PageRequest::new(1, 10));
    assert!(matches!(result, Err(sqlkit::Error::InvalidInput(_))));
}

#[test]
fn test_meta_serializes_pager_links() {
    let pool = setup(200);
    let conn = pool.get().unwrap();

    let page = Article::query(&conn)
        .paginate(PageRequest::new(10, 10))
        .unwrap();
    let links: Vec<PageLink> = page.iter_pages().collect();
    assert_eq!(links.first(), Some(&PageLink::Page(1)));
    assert!(links.contains(&PageLink::Gap));
    assert_eq!(links.last(), Some(&PageLink::Page(20)));

    let meta: PageMeta = page.meta();
    let json = serde_json::to_value(&meta).unwrap();
    assert_eq!(json["page"], 10);
    assert_eq!(json["pages"], 20);
    assert_eq!(json["links"][0], 1);
    assert_eq!(json["links"][2], serde_json::Value::Null);
}

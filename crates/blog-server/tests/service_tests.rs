mod common;

use blog_server::AppError;
use blog_shared::{
    api::{CreateArticleRequest, CreateCommentRequest, UpdateCommentRequest},
    tree,
};
use common::{shape, TestBlog};

#[tokio::test]
async fn create_then_get_article_round_trips() {
    let t = TestBlog::new().await;

    let created = t
        .blog
        .create_article(&CreateArticleRequest::new("T", "A", "C"))
        .await
        .unwrap();
    let fetched = t.blog.get_article(created.id).await.unwrap();

    assert_eq!(fetched.article, created);
    assert_eq!(fetched.article.title, "T");
    assert_eq!(fetched.article.author, "A");
    assert_eq!(fetched.article.content, "C");
    assert_eq!(fetched.article.created_at, fetched.article.updated_at);
    assert!(fetched.comments.is_empty());
}

#[tokio::test]
async fn article_content_keeps_newlines() {
    let t = TestBlog::new().await;
    let content = "first line\n\nthird line\n";

    let created = t
        .blog
        .create_article(&CreateArticleRequest::new("Lines", "A", content))
        .await
        .unwrap();

    assert_eq!(t.blog.get_article(created.id).await.unwrap().article.content, content);
}

#[tokio::test]
async fn blank_fields_are_rejected_without_persisting() {
    let t = TestBlog::new().await;
    t.article("existing").await;

    for (title, author, content) in [("", "A", "C"), ("T", "  ", "C"), ("T", "A", "\n\t")] {
        let err = t
            .blog
            .create_article(&CreateArticleRequest::new(title, author, content))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
    }

    assert_eq!(t.blog.list_articles().await.unwrap().len(), 1);
}

#[tokio::test]
async fn overlong_title_is_rejected() {
    let t = TestBlog::new().await;
    let err = t
        .blog
        .create_article(&CreateArticleRequest::new(&"x".repeat(256), "A", "C"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn list_is_newest_first_and_counts_top_level_only() {
    let t = TestBlog::new().await;
    let older = t.article("older").await;
    let newer = t.article("newer").await;

    let c1 = t.comment(older.id, "one").await;
    t.comment(older.id, "two").await;
    let r1 = t.reply(older.id, c1.id(), "reply").await;
    t.reply(older.id, r1.id(), "deeper").await;

    let list = t.blog.list_articles().await.unwrap();
    let ids: Vec<i64> = list.iter().map(|s| s.article.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
    assert_eq!(list[0].comment_count, 0);
    assert_eq!(list[1].comment_count, 2);
}

#[tokio::test]
async fn missing_article_is_not_found() {
    let t = TestBlog::new().await;

    assert!(matches!(t.blog.get_article(404).await, Err(AppError::NotFound(_))));
    assert!(matches!(t.blog.delete_article(404).await, Err(AppError::NotFound(_))));
    assert!(matches!(
        t.blog
            .create_comment(404, &CreateCommentRequest::new("a", "b"))
            .await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn missing_article_wins_over_invalid_body() {
    let t = TestBlog::new().await;
    let err = t
        .blog
        .create_comment(404, &CreateCommentRequest::new("", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn comment_requires_author_and_content() {
    let t = TestBlog::new().await;
    let article = t.article("a").await;

    for (author, content) in [("", "text"), ("me", "   ")] {
        let err = t
            .blog
            .create_comment(article.id, &CreateCommentRequest::new(author, content))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    assert!(t.blog.get_article(article.id).await.unwrap().comments.is_empty());
}

#[tokio::test]
async fn threaded_scenario() {
    let t = TestBlog::new().await;
    let x = t.article("X").await;

    let c1 = t.comment(x.id, "c1").await;
    let r1 = t.reply(x.id, c1.id(), "r1").await;
    let r2 = t.reply(x.id, r1.id(), "r2").await;

    assert_eq!(r1.comment.parent_id, Some(c1.id()));
    assert_eq!(r2.comment.parent_id, Some(r1.id()));
    assert!(r2.replies.is_empty());

    let fetched = t.blog.get_article(x.id).await.unwrap();
    assert_eq!(shape(&fetched.comments), vec![(0, c1.id()), (1, r1.id()), (2, r2.id())]);
    assert_eq!(fetched.comments[0].replies[0].replies[0].comment.content, "r2");

    t.blog.delete_comment(x.id, c1.id()).await.unwrap();
    assert!(t.blog.get_article(x.id).await.unwrap().comments.is_empty());
}

#[tokio::test]
async fn deleting_a_comment_removes_its_whole_subtree_only() {
    let t = TestBlog::new().await;
    let article = t.article("a").await;

    let a = t.comment(article.id, "A").await;
    let b = t.reply(article.id, a.id(), "B").await;
    let c = t.reply(article.id, b.id(), "C").await;
    let keep = t.comment(article.id, "keep").await;
    let keep_reply = t.reply(article.id, keep.id(), "keep reply").await;

    t.blog.delete_comment(article.id, a.id()).await.unwrap();

    let forest = t.blog.get_article(article.id).await.unwrap().comments;
    assert_eq!(shape(&forest), vec![(0, keep.id()), (1, keep_reply.id())]);

    for gone in [a.id(), b.id(), c.id()] {
        assert!(tree::find_node(&forest, gone).is_none());
        let err = t
            .blog
            .update_comment(article.id, gone, &UpdateCommentRequest::new("zombie"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

#[tokio::test]
async fn deleting_a_nested_reply_keeps_its_ancestors() {
    let t = TestBlog::new().await;
    let article = t.article("a").await;

    let a = t.comment(article.id, "A").await;
    let b = t.reply(article.id, a.id(), "B").await;
    t.reply(article.id, b.id(), "C").await;

    t.blog.delete_comment(article.id, b.id()).await.unwrap();

    let forest = t.blog.get_article(article.id).await.unwrap().comments;
    assert_eq!(shape(&forest), vec![(0, a.id())]);
}

#[tokio::test]
async fn delete_comment_twice_is_not_found() {
    let t = TestBlog::new().await;
    let article = t.article("a").await;
    let c = t.comment(article.id, "c").await;

    t.blog.delete_comment(article.id, c.id()).await.unwrap();
    assert!(matches!(
        t.blog.delete_comment(article.id, c.id()).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_an_article_cascades() {
    let t = TestBlog::new().await;
    let doomed = t.article("doomed").await;
    let other = t.article("other").await;

    let c = t.comment(doomed.id, "c").await;
    let r = t.reply(doomed.id, c.id(), "r").await;
    t.comment(other.id, "survivor").await;

    t.blog.delete_article(doomed.id).await.unwrap();

    assert!(matches!(t.blog.get_article(doomed.id).await, Err(AppError::NotFound(_))));
    assert!(matches!(
        t.blog.delete_comment(doomed.id, r.id()).await,
        Err(AppError::NotFound(_))
    ));

    let list = t.blog.list_articles().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].article.id, other.id);
    assert_eq!(list[0].comment_count, 1);
}

#[tokio::test]
async fn reply_to_comment_of_another_article_is_not_found() {
    let t = TestBlog::new().await;
    let first = t.article("first").await;
    let second = t.article("second").await;
    let foreign = t.comment(first.id, "belongs to first").await;

    let err = t
        .blog
        .create_reply(second.id, foreign.id(), &CreateCommentRequest::new("x", "y"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(t.blog.get_article(second.id).await.unwrap().comments.is_empty());

    let err = t
        .blog
        .create_reply(first.id, 12345, &CreateCommentRequest::new("x", "y"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn update_reaches_any_depth_and_keeps_replies() {
    let t = TestBlog::new().await;
    let article = t.article("a").await;

    let c = t.comment(article.id, "c").await;
    let r1 = t.reply(article.id, c.id(), "r1").await;
    let r2 = t.reply(article.id, r1.id(), "r2").await;

    let updated = t
        .blog
        .update_comment(article.id, r1.id(), &UpdateCommentRequest::new("edited"))
        .await
        .unwrap();

    assert_eq!(updated.comment.content, "edited");
    assert_eq!(updated.comment.author, r1.comment.author);
    assert_eq!(updated.comment.created_at, r1.comment.created_at);
    assert!(updated.comment.updated_at >= r1.comment.updated_at);
    assert_eq!(shape(&updated.replies), vec![(0, r2.id())]);

    let forest = t.blog.get_article(article.id).await.unwrap().comments;
    assert_eq!(tree::find_node(&forest, r1.id()).unwrap().comment.content, "edited");
}

#[tokio::test]
async fn update_rejects_blank_content_and_foreign_article() {
    let t = TestBlog::new().await;
    let first = t.article("first").await;
    let second = t.article("second").await;
    let c = t.comment(first.id, "original").await;

    let err = t
        .blog
        .update_comment(first.id, c.id(), &UpdateCommentRequest::new("  "))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = t
        .blog
        .update_comment(second.id, c.id(), &UpdateCommentRequest::new("moved?"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let forest = t.blog.get_article(first.id).await.unwrap().comments;
    assert_eq!(forest[0].comment.content, "original");
}

#[tokio::test]
async fn ids_are_unique_across_articles_and_comments() {
    let t = TestBlog::new().await;
    let a = t.article("a").await;
    let c = t.comment(a.id, "c").await;
    let r = t.reply(a.id, c.id(), "r").await;
    t.blog.delete_comment(a.id, r.id()).await.unwrap();
    let r2 = t.reply(a.id, c.id(), "r2").await;

    let mut ids = vec![a.id, c.id(), r.id(), r2.id()];
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);
    assert!(r2.id() > r.id());
}

#[tokio::test]
async fn state_survives_reopening_the_store() {
    let t = TestBlog::new().await;
    let article = t.article("persisted").await;
    let c = t.comment(article.id, "c").await;
    let r = t.reply(article.id, c.id(), "r").await;

    let reopened = t.reopen().await;
    let fetched = reopened.get_article(article.id).await.unwrap();
    assert_eq!(fetched.article.title, "persisted");
    assert_eq!(shape(&fetched.comments), vec![(0, c.id()), (1, r.id())]);
}

#[tokio::test]
async fn persisted_document_nests_replies() {
    let t = TestBlog::new().await;
    let article = t.article("nested").await;
    let c = t.comment(article.id, "c").await;
    let r = t.reply(article.id, c.id(), "r").await;

    let raw = std::fs::read_to_string(t.dir.path().join("database.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();

    let comment = &doc["articles"][0]["comments"][0];
    assert_eq!(comment["id"], c.id());
    assert_eq!(comment["replies"][0]["id"], r.id());
    assert_eq!(comment["replies"][0]["parentId"], c.id());
    assert_eq!(comment["replies"][0]["articleId"], article.id);
}

#[tokio::test]
async fn seeds_only_an_empty_store() {
    let t = TestBlog::new().await;

    let seeded = t.blog.seed_if_empty().await.unwrap().unwrap();
    assert_eq!(seeded.title, blog_server::service::WELCOME_TITLE);
    assert!(t.blog.seed_if_empty().await.unwrap().is_none());
    assert_eq!(t.blog.list_articles().await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_replies_are_all_kept() {
    let t = TestBlog::new().await;
    let article = t.article("busy").await;
    let root = t.comment(article.id, "root").await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let blog = t.blog.clone();
        let (article_id, parent_id) = (article.id, root.id());
        handles.push(tokio::spawn(async move {
            blog.create_reply(
                article_id,
                parent_id,
                &CreateCommentRequest::new("bot", &format!("reply {i}")),
            )
            .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let forest = t.blog.get_article(article.id).await.unwrap().comments;
    assert_eq!(forest[0].replies.len(), 16);
    assert_eq!(tree::count_nodes(&forest), 17);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_see_an_article_without_its_comments() {
    let t = TestBlog::new().await;

    for round in 0..50 {
        let article = t.article(&format!("doomed {round}")).await;
        t.comment(article.id, "always here").await;

        let blog = t.blog.clone();
        let id = article.id;
        let reader = tokio::spawn(async move {
            loop {
                match blog.get_article(id).await {
                    Ok(seen) => assert_eq!(
                        seen.comments.len(),
                        1,
                        "article {id} was returned without its comment"
                    ),
                    Err(AppError::NotFound(_)) => break,
                    Err(e) => panic!("unexpected error: {e}"),
                }
                tokio::task::yield_now().await;
            }
        });

        t.blog.delete_article(id).await.unwrap();
        reader.await.unwrap();
    }
}

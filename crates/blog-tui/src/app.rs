use anyhow::Result;
use blog_shared::{
    api::{CreateArticleRequest, CreateCommentRequest, UpdateCommentRequest},
    tree, ArticleSummary, ArticleWithComments, CommentNode,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::api::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    ArticleDetail,
    AddArticle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleField {
    Title,
    Author,
    Content,
}

impl ArticleField {
    fn next(self) -> Self {
        match self {
            Self::Title => Self::Author,
            Self::Author => Self::Content,
            Self::Content => Self::Title,
        }
    }
}

/// What the comment form will do on submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentForm {
    New,
    Reply(i64),
    Edit(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentField {
    Author,
    Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    Article(i64),
    Comment(i64),
}

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
}

pub struct App {
    pub api: ApiClient,
    pub view: View,

    pub error_message: Option<String>,
    pub status_message: Option<String>,
    pub confirm_delete: Option<DeleteTarget>,

    // Home
    pub articles: Vec<ArticleSummary>,
    pub selected_article: usize,

    // Article detail
    pub current: Option<ArticleWithComments>,
    pub selected_comment: usize,
    pub comment_form: Option<CommentForm>,
    pub comment_field: CommentField,
    pub comment_author: String,
    pub comment_content: String,

    // Add article
    pub draft: CreateArticleRequest,
    pub draft_field: ArticleField,
}

impl App {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            view: View::Home,
            error_message: None,
            status_message: None,
            confirm_delete: None,
            articles: Vec::new(),
            selected_article: 0,
            current: None,
            selected_comment: 0,
            comment_form: None,
            comment_field: CommentField::Author,
            comment_author: String::new(),
            comment_content: String::new(),
            draft: CreateArticleRequest::default(),
            draft_field: ArticleField::Title,
        }
    }

    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }

    fn set_status(&mut self, message: &str) {
        self.status_message = Some(message.to_string());
    }

    /// Comments of the open article in display order, with their depth.
    pub fn comment_rows(&self) -> Vec<(usize, &CommentNode)> {
        self.current
            .as_ref()
            .map(|a| tree::walk(&a.comments))
            .unwrap_or_default()
    }

    pub fn selected_comment_node(&self) -> Option<&CommentNode> {
        self.comment_rows()
            .get(self.selected_comment)
            .map(|(_, node)| *node)
    }

    /// Handle key events, returns true if app should quit
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(true);
        }

        // Any key dismisses the error popup
        if self.error_message.take().is_some() {
            return Ok(false);
        }

        if let Some(target) = self.confirm_delete.take() {
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                self.do_delete(target).await;
            }
            return Ok(false);
        }

        match self.view {
            View::Home => self.handle_home_key(key).await,
            View::ArticleDetail if self.comment_form.is_some() => {
                self.handle_comment_form_key(key).await;
                Ok(false)
            }
            View::ArticleDetail => self.handle_detail_key(key).await,
            View::AddArticle => {
                self.handle_add_article_key(key).await;
                Ok(false)
            }
        }
    }

    async fn handle_home_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected_article + 1 < self.articles.len() {
                    self.selected_article += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_article = self.selected_article.saturating_sub(1);
            }
            KeyCode::Enter => {
                if let Some(id) = self.articles.get(self.selected_article).map(|a| a.article.id) {
                    self.open_article(id).await;
                }
            }
            KeyCode::Char('n') => {
                self.draft = CreateArticleRequest::default();
                self.draft_field = ArticleField::Title;
                self.view = View::AddArticle;
            }
            KeyCode::Char('d') => {
                if let Some(summary) = self.articles.get(self.selected_article) {
                    self.confirm_delete = Some(DeleteTarget::Article(summary.article.id));
                }
            }
            KeyCode::Char('r') => self.load_articles().await,
            _ => {}
        }
        Ok(false)
    }

    async fn handle_detail_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('h') => self.go_home().await,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected_comment + 1 < self.comment_rows().len() {
                    self.selected_comment += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_comment = self.selected_comment.saturating_sub(1);
            }
            KeyCode::Char('c') => self.start_comment_form(CommentForm::New),
            KeyCode::Char('R') => {
                if let Some(id) = self.selected_comment_node().map(CommentNode::id) {
                    self.start_comment_form(CommentForm::Reply(id));
                }
            }
            KeyCode::Char('e') => {
                if let Some(id) = self.selected_comment_node().map(CommentNode::id) {
                    self.start_comment_form(CommentForm::Edit(id));
                }
            }
            KeyCode::Char('x') => {
                if let Some(id) = self.selected_comment_node().map(CommentNode::id) {
                    self.confirm_delete = Some(DeleteTarget::Comment(id));
                }
            }
            KeyCode::Char('r') => self.reload_current().await,
            _ => {}
        }
        Ok(false)
    }

    fn start_comment_form(&mut self, form: CommentForm) {
        self.comment_content = match form {
            CommentForm::Edit(id) => self
                .current
                .as_ref()
                .and_then(|a| tree::find_node(&a.comments, id))
                .map(|node| node.comment.content.clone())
                .unwrap_or_default(),
            CommentForm::New | CommentForm::Reply(_) => String::new(),
        };
        // Editing only touches the content; the author is kept between forms.
        self.comment_field = match form {
            CommentForm::Edit(_) => CommentField::Content,
            _ if self.comment_author.is_empty() => CommentField::Author,
            _ => CommentField::Content,
        };
        self.comment_form = Some(form);
    }

    async fn handle_comment_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.comment_form else {
            return;
        };

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            self.submit_comment(form).await;
            return;
        }

        match key.code {
            KeyCode::Esc => self.comment_form = None,
            KeyCode::Tab | KeyCode::BackTab if !matches!(form, CommentForm::Edit(_)) => {
                self.comment_field = match self.comment_field {
                    CommentField::Author => CommentField::Content,
                    CommentField::Content => CommentField::Author,
                };
            }
            KeyCode::Enter => match self.comment_field {
                CommentField::Author => self.comment_field = CommentField::Content,
                CommentField::Content => self.comment_content.push('\n'),
            },
            KeyCode::Char(c) => self.comment_input().push(c),
            KeyCode::Backspace => {
                self.comment_input().pop();
            }
            _ => {}
        }
    }

    fn comment_input(&mut self) -> &mut String {
        match self.comment_field {
            CommentField::Author => &mut self.comment_author,
            CommentField::Content => &mut self.comment_content,
        }
    }

    async fn submit_comment(&mut self, form: CommentForm) {
        let Some(article_id) = self.current.as_ref().map(|a| a.article.id) else {
            return;
        };

        let result = match form {
            CommentForm::Edit(id) => {
                let req = UpdateCommentRequest::new(&self.comment_content);
                if let Err(e) = req.validate() {
                    self.set_error(e.to_string());
                    return;
                }
                self.api
                    .update_comment(article_id, id, &self.comment_content)
                    .await
            }
            CommentForm::New | CommentForm::Reply(_) => {
                let fields = match CreateCommentRequest::new(&self.comment_author, &self.comment_content)
                    .validate()
                {
                    Ok(fields) => fields,
                    Err(e) => {
                        self.set_error(e.to_string());
                        return;
                    }
                };
                match form {
                    CommentForm::Reply(parent_id) => {
                        self.api
                            .create_reply(article_id, parent_id, &fields.author, &fields.content)
                            .await
                    }
                    _ => {
                        self.api
                            .create_comment(article_id, &fields.author, &fields.content)
                            .await
                    }
                }
            }
        };

        match result {
            Ok(_) => {
                self.comment_form = None;
                self.comment_content.clear();
                self.set_status(match form {
                    CommentForm::New => "Comment added",
                    CommentForm::Reply(_) => "Reply added",
                    CommentForm::Edit(_) => "Comment updated",
                });
                self.reload_current().await;
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    async fn handle_add_article_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            self.submit_article().await;
            return;
        }

        match key.code {
            KeyCode::Esc => self.view = View::Home,
            KeyCode::Tab | KeyCode::BackTab => self.draft_field = self.draft_field.next(),
            KeyCode::Enter => match self.draft_field {
                ArticleField::Content => self.draft.content.push('\n'),
                field => self.draft_field = field.next(),
            },
            KeyCode::Char(c) => self.draft_input().push(c),
            KeyCode::Backspace => {
                self.draft_input().pop();
            }
            _ => {}
        }
    }

    fn draft_input(&mut self) -> &mut String {
        match self.draft_field {
            ArticleField::Title => &mut self.draft.title,
            ArticleField::Author => &mut self.draft.author,
            ArticleField::Content => &mut self.draft.content,
        }
    }

    async fn submit_article(&mut self) {
        if let Err(e) = self.draft.validate() {
            self.set_error(e.to_string());
            return;
        }

        match self.api.create_article(&self.draft).await {
            Ok(article) => {
                self.draft = CreateArticleRequest::default();
                self.set_status("Article published");
                self.open_article(article.id).await;
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    async fn do_delete(&mut self, target: DeleteTarget) {
        match target {
            DeleteTarget::Article(id) => match self.api.delete_article(id).await {
                Ok(()) => {
                    self.set_status("Article deleted");
                    self.load_articles().await;
                }
                Err(e) => self.set_error(e.to_string()),
            },
            DeleteTarget::Comment(id) => {
                let Some(article_id) = self.current.as_ref().map(|a| a.article.id) else {
                    return;
                };
                match self.api.delete_comment(article_id, id).await {
                    Ok(()) => {
                        if let Some(current) = self.current.as_mut() {
                            tree::remove_node(&mut current.comments, id);
                        }
                        self.set_status("Comment deleted");
                        self.reload_current().await;
                    }
                    Err(e) => self.set_error(e.to_string()),
                }
            }
        }
    }

    pub async fn load_articles(&mut self) {
        match self.api.list_articles().await {
            Ok(articles) => self.on_articles_loaded(articles),
            Err(e) => self.set_error(format!("Failed to load articles: {}", e)),
        }
    }

    pub fn on_articles_loaded(&mut self, articles: Vec<ArticleSummary>) {
        self.articles = articles;
        if self.selected_article >= self.articles.len() {
            self.selected_article = self.articles.len().saturating_sub(1);
        }
    }

    async fn open_article(&mut self, id: i64) {
        match self.api.get_article(id).await {
            Ok(article) => {
                self.on_article_loaded(article);
                self.selected_comment = 0;
                self.comment_form = None;
                self.view = View::ArticleDetail;
            }
            Err(e) => self.set_error(format!("Failed to open article: {}", e)),
        }
    }

    async fn reload_current(&mut self) {
        let Some(id) = self.current.as_ref().map(|a| a.article.id) else {
            return;
        };
        match self.api.get_article(id).await {
            Ok(article) => self.on_article_loaded(article),
            Err(e) => self.set_error(format!("Failed to reload article: {}", e)),
        }
    }

    pub fn on_article_loaded(&mut self, article: ArticleWithComments) {
        self.current = Some(article);
        let rows = self.comment_rows().len();
        if self.selected_comment >= rows {
            self.selected_comment = rows.saturating_sub(1);
        }
    }

    async fn go_home(&mut self) {
        self.current = None;
        self.comment_form = None;
        self.view = View::Home;
        self.load_articles().await;
    }
}

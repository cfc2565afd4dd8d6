pub mod page;


use axum::Router;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::response::Html;
use axum::routing::get;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use self::page::render_page;
use crate::embeddings::Embedder;
use crate::generation::AnswerModel;
use crate::knowledge::KnowledgeBase;
use crate::retrieval::join_passages;
use crate::{QaError, Result};

pub const MISSING_QUESTION: &str = "[Please enter a question]";
pub const RETRIEVAL_FAILED: &str = "[Could not retrieve context for question]";
pub const INTERNAL_FAILURE: &str = "[Something went wrong while answering]";

/// Everything a request needs, built once at startup and shared read-only
pub struct AppState {
    knowledge: KnowledgeBase,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn AnswerModel>,
    top_k: usize,
}

/// What the page shows after a submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exchange {
    pub answer: String,
    pub context: String,
}

impl Exchange {
    fn placeholder(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            context: String::new(),
        }
    }
}

impl AppState {
    #[inline]
    pub fn new(
        knowledge: KnowledgeBase,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn AnswerModel>,
        top_k: usize,
    ) -> Self {
        Self {
            knowledge,
            embedder,
            model,
            top_k,
        }
    }

    #[inline]
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    #[inline]
    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve context for the question and ask the model. Blocking.
    ///
    /// A missing or blank question short-circuits to [`MISSING_QUESTION`]
    /// without touching the embedder or the model.
    #[inline]
    pub fn respond(&self, question: Option<&str>) -> Exchange {
        let Some(question) = question.filter(|q| !q.trim().is_empty()) else {
            debug!("Submission without a question");
            return Exchange::placeholder(MISSING_QUESTION);
        };

        let context = match self
            .knowledge
            .passages(question, self.embedder.as_ref(), self.top_k)
        {
            Ok(passages) => {
                for passage in &passages {
                    debug!(
                        "Passage {} at distance {:.4}",
                        passage.index, passage.distance
                    );
                }
                join_passages(&passages)
            }
            Err(e) => {
                warn!("Retrieval failed for question {:?}: {:#}", question, e);
                return Exchange::placeholder(RETRIEVAL_FAILED);
            }
        };

        let answer = self.model.answer(question, &context);
        Exchange { answer, context }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuestionForm {
    question: Option<String>,
}

/// The single-page application: `GET /` shows the form, `POST /` answers it
#[inline]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(show_form).post(answer_question))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[expect(clippy::unused_async, reason = "axum handlers are async")]
async fn show_form() -> Html<String> {
    Html(render_page("", ""))
}

async fn answer_question(
    State(state): State<Arc<AppState>>,
    form: std::result::Result<Form<QuestionForm>, FormRejection>,
) -> Html<String> {
    let question = match form {
        Ok(Form(form)) => form.question,
        Err(rejection) => {
            debug!("Unreadable form submission: {}", rejection);
            None
        }
    };

    let exchange = tokio::task::spawn_blocking(move || state.respond(question.as_deref()))
        .await
        .unwrap_or_else(|e| {
            error!("Answering task failed: {}", e);
            Exchange::placeholder(INTERNAL_FAILURE)
        });

    Html(render_page(&exchange.answer, &exchange.context))
}

/// Bind and serve until Ctrl-C
#[inline]
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| QaError::Server(e.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

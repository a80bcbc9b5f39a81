//! End-to-end dispatch tests with an in-memory sink

use async_trait::async_trait;
use axum::extract::{Json, State};
use gastos_bot::api::{handlers, AppState};
use gastos_bot::core::{replies, AuthorizationGate, CategoryRegistry, Dispatcher, RecordSink};
use gastos_bot::models::{AppResult, InboundMessage, ParsedExpense, ReplyFormat, Sender};
use gastos_bot::BotStats;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MemorySink {
    rows: Mutex<Vec<ParsedExpense>>,
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn append_expense(&self, expense: &ParsedExpense) -> AppResult<()> {
        self.rows.lock().unwrap().push(expense.clone());
        Ok(())
    }
}

const OWNER: i64 = 1001;
const STRANGER: i64 = 666;

fn sender(id: i64, name: &str) -> Sender {
    Sender {
        id,
        display_name: name.to_string(),
    }
}

fn setup() -> (Dispatcher, Arc<MemorySink>, Arc<BotStats>) {
    let sink = Arc::new(MemorySink::default());
    let stats = Arc::new(BotStats::new());
    let dispatcher = Dispatcher::new(
        AuthorizationGate::new([OWNER]),
        Arc::new(CategoryRegistry::from_column(["Categoria", "Comida", "Ocio"])),
        sink.clone(),
        stats.clone(),
        "Gastos",
    );
    (dispatcher, sink, stats)
}

#[tokio::test]
async fn test_unauthorized_user_gets_nothing() {
    let (d, sink, stats) = setup();
    let stranger = sender(STRANGER, "Eve");

    for message in [
        InboundMessage::command(1, stranger.clone(), "start"),
        InboundMessage::command(1, stranger.clone(), "categorias"),
        InboundMessage::text(1, stranger.clone(), "comida 10"),
        InboundMessage::text(1, stranger.clone(), "hola"),
    ] {
        assert!(d.handle(&message).await.is_none());
    }

    assert!(sink.rows.lock().unwrap().is_empty());
    assert_eq!(stats.snapshot().denied, 4);
}

#[tokio::test]
async fn test_start_greets_by_name() {
    let (d, _, _) = setup();
    let reply = d
        .handle(&InboundMessage::command(1, sender(OWNER, "Ana <3"), "start"))
        .await
        .unwrap();
    assert_eq!(reply.format, ReplyFormat::Html);
    assert!(reply.text.starts_with("¡Hola Ana &lt;3!"));
}

#[tokio::test]
async fn test_categories_listing() {
    let (d, _, _) = setup();
    let reply = d
        .handle(&InboundMessage::command(1, sender(OWNER, "Ana"), "categorias"))
        .await
        .unwrap();
    assert!(reply.text.ends_with("Comida\nOcio"));
}

#[tokio::test]
async fn test_expense_flow() {
    let (d, sink, stats) = setup();
    let ana = sender(OWNER, "Ana");

    let reply = d
        .handle(&InboundMessage::text(1, ana.clone(), "ocio 1234.5 'cine'"))
        .await
        .unwrap();
    assert_eq!(
        reply.text,
        "✅ ¡Registrado en 'Gastos'!\nMonto: $1,234.50\nCategoría: Ocio\nDescripción: cine"
    );

    let rows = sink.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].actor, "Ana");
    assert_eq!(rows[0].description, "cine");
    drop(rows);

    let reply = d
        .handle(&InboundMessage::text(1, ana.clone(), "comida"))
        .await
        .unwrap();
    assert!(reply.text.contains("<b>Comida</b>"));

    let reply = d
        .handle(&InboundMessage::text(1, ana, "buenos días"))
        .await
        .unwrap();
    assert_eq!(reply, replies::unrecognized());

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.messages_handled, 3);
    assert_eq!(snapshot.expenses_recorded, 1);
    assert_eq!(snapshot.total_rejections(), 1);
    assert_eq!(snapshot.unrecognized, 1);
    assert_eq!(snapshot.known_category_expenses, 1);
    assert_eq!(snapshot.free_form_category_expenses, 0);
}

#[tokio::test]
async fn test_stats_endpoint_never_echoes_user_text() {
    let (d, sink, stats) = setup();
    let ana = sender(OWNER, "Ana");

    for i in 0..100 {
        let text = format!("gasto 1 regalo secreto para maria {}", i);
        assert!(d.handle(&InboundMessage::text(1, ana.clone(), text)).await.is_some());
    }
    assert_eq!(sink.rows.lock().unwrap().len(), 100);

    let state = Arc::new(AppState::new(stats, 2));
    let Json(response) = handlers::get_stats(State(state)).await;
    let body = serde_json::to_string(&response).unwrap();

    assert!(!body.to_lowercase().contains("regalo"));
    assert!(!body.contains("Ana"));
    assert_eq!(response.data.counters.free_form_category_expenses, 100);
    assert_eq!(response.data.counters.known_category_expenses, 0);
}

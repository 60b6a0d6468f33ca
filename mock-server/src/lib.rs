//! In-memory stand-in for both breed upstreams.
//!
//! Serves the breeds REST API (`/api/breeds/...`, `/health`) and the
//! workflow-run API (`/workflows/...`) from one `Store`. Error bodies follow
//! the `{"detail": ...}` convention of the real services. Workflow routes
//! require the configured basic credential when one is set.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const SUMMARY_TASK: &str = "print_summary";
pub const SUMMARY_KEY: &str = "breed_summary";
pub const FETCH_TASK: &str = "fetch_dog_breed";
pub const FETCH_KEY: &str = "return_value";
pub const DEFAULT_DAG_ID: &str = "dog_breed_fetcher";

/// One row of the breeds table.
#[derive(Clone, Debug)]
pub struct Breed {
    pub id: Uuid,
    pub breed_name: String,
    pub description: Option<String>,
    pub life_expectancy: Option<String>,
    pub dag_id: String,
    pub dag_run_id: String,
    pub execution_date: String,
    pub created_at: String,
}

/// Breed row as the REST API serializes it, including compatibility
/// aliases.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BreedRow {
    pub id: String,
    pub breed_name: String,
    pub description: Option<String>,
    pub life_expectancy: Option<String>,
    pub life_span: Option<String>,
    pub dag_id: String,
    pub dag_run_id: String,
    pub run_id: Option<String>,
    pub task_id: String,
    pub execution_date: String,
    pub start_date: Option<String>,
    pub created_at: String,
    pub state: Option<String>,
}

impl From<&Breed> for BreedRow {
    fn from(b: &Breed) -> Self {
        Self {
            id: b.id.to_string(),
            breed_name: b.breed_name.clone(),
            description: b.description.clone(),
            life_expectancy: b.life_expectancy.clone(),
            life_span: b.life_expectancy.clone(),
            dag_id: b.dag_id.clone(),
            dag_run_id: b.dag_run_id.clone(),
            run_id: Some(b.dag_run_id.clone()),
            task_id: FETCH_TASK.to_string(),
            execution_date: b.execution_date.clone(),
            start_date: Some(b.execution_date.clone()),
            created_at: b.created_at.clone(),
            state: Some("success".to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BreedStats {
    pub total_breeds: u64,
    pub unique_breeds: u64,
    pub latest_execution: Option<String>,
}

/// One workflow run and its value store.
#[derive(Clone, Debug)]
pub struct Run {
    pub run_id: String,
    pub start_date: String,
    pub state: String,
    values: HashMap<(String, String), Value>,
}

impl Run {
    pub fn new(run_id: &str, start_date: &str, state: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            start_date: start_date.to_string(),
            state: state.to_string(),
            values: HashMap::new(),
        }
    }

    pub fn with_value(mut self, task: &str, key: &str, value: Value) -> Self {
        self.values.insert((task.to_string(), key.to_string()), value);
        self
    }

    /// Run that completed both steps for `breed_name`.
    pub fn completed(run_id: &str, start_date: &str, breed_name: &str, life: &str) -> Self {
        Self::new(run_id, start_date, "success")
            .with_value(
                FETCH_TASK,
                FETCH_KEY,
                json!({
                    "breed_name": breed_name,
                    "description": format!("{breed_name} description"),
                    "life_expectancy": life,
                    "full_data": {"type": "breed"},
                }),
            )
            .with_value(
                SUMMARY_TASK,
                SUMMARY_KEY,
                json!({
                    "breed_name": breed_name,
                    "life_span": life,
                    "description": format!("{breed_name} description"),
                    "message": format!("Random dog breed: {breed_name}"),
                }),
            )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRow {
    pub dag_run_id: String,
    pub dag_id: String,
    pub start_date: String,
    pub state: String,
}

#[derive(Debug, Default)]
pub struct Store {
    breeds: Vec<Breed>,
    runs: HashMap<String, Vec<Run>>,
    auth_header: Option<String>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `Authorization: Basic ...` on workflow routes.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        let raw = format!("{username}:{password}");
        self.auth_header = Some(format!("Basic {}", STANDARD.encode(raw)));
        self
    }

    pub fn add_breed(
        &mut self,
        dag_id: &str,
        dag_run_id: &str,
        breed_name: &str,
        life_expectancy: Option<&str>,
        execution_date: &str,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.breeds.push(Breed {
            id,
            breed_name: breed_name.to_string(),
            description: Some(format!("{breed_name} description")),
            life_expectancy: life_expectancy.map(str::to_string),
            dag_id: dag_id.to_string(),
            dag_run_id: dag_run_id.to_string(),
            execution_date: execution_date.to_string(),
            created_at: execution_date.to_string(),
        });
        id
    }

    pub fn clear_breeds(&mut self) {
        self.breeds.clear();
    }

    pub fn add_run(&mut self, dag_id: &str, run: Run) {
        self.runs.entry(dag_id.to_string()).or_default().push(run);
    }

    /// Sample data for local runs: four breeds, and four runs of which one
    /// only has the fetch result and one has no values at all.
    pub fn seeded() -> Self {
        let mut store = Store::new().with_credentials("admin", "admin");
        let samples = [
            ("scheduled__2024-05-01T10:00:00+00:00", "Akita", "10-13", "2024-05-01T10:00:00"),
            ("scheduled__2024-05-01T11:00:00+00:00", "Basenji", "13-14", "2024-05-01T11:00:00"),
            ("scheduled__2024-05-01T12:00:00+00:00", "Collie", "12-14", "2024-05-01T12:00:00"),
            ("scheduled__2024-05-01T13:00:00+00:00", "Dalmatian", "11-13", "2024-05-01T13:00:00"),
        ];
        for (run_id, name, life, at) in samples {
            let life = format!("{life} years");
            store.add_breed(DEFAULT_DAG_ID, run_id, name, Some(life.as_str()), at);
        }
        let (r1, r2, r3, r4) = (samples[0], samples[1], samples[2], samples[3]);
        store.add_run(DEFAULT_DAG_ID, Run::completed(r1.0, r1.3, r1.1, "10-13 years"));
        store.add_run(
            DEFAULT_DAG_ID,
            Run::new(r2.0, r2.3, "success").with_value(
                FETCH_TASK,
                FETCH_KEY,
                json!({"breed_name": r2.1, "life_expectancy": "13-14 years", "description": "Barkless"}),
            ),
        );
        store.add_run(DEFAULT_DAG_ID, Run::new(r3.0, r3.3, "failed"));
        store.add_run(DEFAULT_DAG_ID, Run::completed(r4.0, r4.3, r4.1, "11-13 years"));
        store
    }

    fn breeds_newest_first(&self) -> Vec<&Breed> {
        let mut breeds: Vec<&Breed> = self.breeds.iter().collect();
        breeds.sort_by(|a, b| {
            b.execution_date
                .cmp(&a.execution_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        breeds
    }
}

pub type Db = Arc<RwLock<Store>>;

type Failure = (StatusCode, Json<Value>);

fn failure(status: StatusCode, detail: impl Into<String>) -> Failure {
    (status, Json(json!({ "detail": detail.into() })))
}

fn check_limit(limit: usize) -> Result<usize, Failure> {
    if (1..=100).contains(&limit) {
        Ok(limit)
    } else {
        Err(failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            "limit must be between 1 and 100",
        ))
    }
}

pub fn app() -> Router {
    app_with(Arc::new(RwLock::new(Store::new())))
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/breeds", get(list_breeds))
        .route("/api/breeds/recent", get(recent_breeds))
        .route("/api/breeds/stats", get(breed_stats))
        .route("/api/breeds/search/{name}", get(search_breeds))
        .route("/api/breeds/{id}", get(get_breed))
        .route("/workflows/{dag_id}/runs", get(list_runs))
        .route(
            "/workflows/{dag_id}/runs/{run_id}/tasks/{task}/values/{key}",
            get(run_value),
        )
        .with_state(db)
}

/// Serves the seeded store.
pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, Arc::new(RwLock::new(Store::seeded()))).await
}

pub async fn serve(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(db)).await
}

async fn health() -> Json<Value> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    Json(json!({"status": "healthy", "database": "in-memory", "timestamp": now.to_string()}))
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default = "default_list_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
    dag_id: Option<String>,
}

fn default_list_limit() -> usize {
    10
}

async fn list_breeds(
    State(db): State<Db>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<BreedRow>>, Failure> {
    let limit = check_limit(q.limit)?;
    let store = db.read().await;
    let rows = store
        .breeds_newest_first()
        .into_iter()
        .filter(|b| q.dag_id.as_deref().map_or(true, |id| b.dag_id == id))
        .skip(q.offset)
        .take(limit)
        .map(BreedRow::from)
        .collect();
    Ok(Json(rows))
}

#[derive(Deserialize)]
struct RecentQuery {
    #[serde(default = "default_recent_limit")]
    limit: usize,
    #[serde(default = "default_dag_id")]
    dag_id: String,
}

fn default_recent_limit() -> usize {
    20
}

fn default_dag_id() -> String {
    DEFAULT_DAG_ID.to_string()
}

async fn recent_breeds(
    State(db): State<Db>,
    Query(q): Query<RecentQuery>,
) -> Result<Json<Vec<BreedRow>>, Failure> {
    let limit = check_limit(q.limit)?;
    let store = db.read().await;
    let rows = store
        .breeds_newest_first()
        .into_iter()
        .filter(|b| b.dag_id == q.dag_id)
        .take(limit)
        .map(BreedRow::from)
        .collect();
    Ok(Json(rows))
}

#[derive(Deserialize)]
struct StatsQuery {
    dag_id: Option<String>,
}

async fn breed_stats(State(db): State<Db>, Query(q): Query<StatsQuery>) -> Json<BreedStats> {
    let store = db.read().await;
    let selected: Vec<&Breed> = store
        .breeds
        .iter()
        .filter(|b| q.dag_id.as_deref().map_or(true, |id| b.dag_id == id))
        .collect();
    let unique: HashSet<&str> = selected.iter().map(|b| b.breed_name.as_str()).collect();
    Json(BreedStats {
        total_breeds: selected.len() as u64,
        unique_breeds: unique.len() as u64,
        latest_execution: selected.iter().map(|b| b.execution_date.clone()).max(),
    })
}

async fn get_breed(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<BreedRow>, Failure> {
    let not_found = || failure(StatusCode::NOT_FOUND, "Breed not found");
    let id: Uuid = id.parse().map_err(|_| not_found())?;
    let store = db.read().await;
    store
        .breeds
        .iter()
        .find(|b| b.id == id)
        .map(|b| Json(BreedRow::from(b)))
        .ok_or_else(not_found)
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default = "default_list_limit")]
    limit: usize,
}

async fn search_breeds(
    State(db): State<Db>,
    Path(name): Path<String>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<BreedRow>>, Failure> {
    let limit = check_limit(q.limit)?;
    let needle = name.to_lowercase();
    let store = db.read().await;
    let rows = store
        .breeds_newest_first()
        .into_iter()
        .filter(|b| b.breed_name.to_lowercase().contains(&needle))
        .take(limit)
        .map(BreedRow::from)
        .collect();
    Ok(Json(rows))
}

fn authorize(store: &Store, headers: &HeaderMap) -> Result<(), Failure> {
    let Some(expected) = &store.auth_header else {
        return Ok(());
    };
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(given) if given == expected => Ok(()),
        _ => Err(failure(StatusCode::UNAUTHORIZED, "Unauthorized")),
    }
}

#[derive(Deserialize)]
struct RunsQuery {
    #[serde(default = "default_list_limit")]
    limit: usize,
    order_by: Option<String>,
}

async fn list_runs(
    State(db): State<Db>,
    Path(dag_id): Path<String>,
    Query(q): Query<RunsQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let limit = check_limit(q.limit)?;
    let runs = store.runs.get(&dag_id).ok_or_else(|| {
        failure(
            StatusCode::NOT_FOUND,
            format!("DAG with dag_id: '{dag_id}' was not found"),
        )
    })?;

    let mut ordered: Vec<&Run> = runs.iter().collect();
    if q.order_by.as_deref() == Some("start_date") {
        ordered.sort_by(|a, b| a.start_date.cmp(&b.start_date));
    } else {
        ordered.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    }
    let rows: Vec<RunRow> = ordered
        .into_iter()
        .take(limit)
        .map(|r| RunRow {
            dag_run_id: r.run_id.clone(),
            dag_id: dag_id.clone(),
            start_date: r.start_date.clone(),
            state: r.state.clone(),
        })
        .collect();
    Ok(Json(json!({ "dag_runs": rows, "total_entries": runs.len() })))
}

async fn run_value(
    State(db): State<Db>,
    Path((dag_id, run_id, task, key)): Path<(String, String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let run = store
        .runs
        .get(&dag_id)
        .and_then(|runs| runs.iter().find(|r| r.run_id == run_id))
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, format!("DagRun '{run_id}' not found")))?;
    let value = run.values.get(&(task.clone(), key.clone())).ok_or_else(|| {
        failure(
            StatusCode::NOT_FOUND,
            format!("XCom entry '{key}' of task '{task}' not found"),
        )
    })?;
    Ok(Json(json!({ "value": value, "timestamp": run.start_date })))
}

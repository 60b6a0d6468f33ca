//! Breed repositories: one per upstream integration, one contract.
//!
//! # Design
//! - `DirectRecordRepository` reads rows that are already close to the
//!   normalized shape. A body that is not an array is coerced to an empty
//!   batch, never an error.
//! - `RunLogRepository` lists workflow runs, then reads each run's summary
//!   value, falling back to the fetch step's raw return value. Runs are
//!   looked up one at a time; a run whose lookups all fail is skipped and
//!   reported in `BreedBatch::skipped`, it never fails the batch.
//! - Only the top-level request of each strategy propagates errors.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::HttpClient;
use crate::config::{Config, Integration};
use crate::error::{ApiError, LookupError};
use crate::http::RequestOptions;
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    BreedBatch, BreedDto, BreedRecord, BreedStats, BreedSummaryValue, DerivedBreed,
    FetchResultValue, HealthCheck, RunDescriptor, RunList, RunValue,
};

pub const DEFAULT_WORKFLOW_ID: &str = "dog_breed_fetcher";
pub const DEFAULT_LIMIT: usize = 10;

/// Step and key under which the summary step publishes its output.
pub const SUMMARY_TASK: &str = "print_summary";
pub const SUMMARY_KEY: &str = "breed_summary";

/// Step and key holding the fetch step's raw return value.
pub const FETCH_TASK: &str = "fetch_dog_breed";
pub const FETCH_KEY: &str = "return_value";

/// Source of normalized breed records.
pub trait BreedRepository {
    /// Most recent records, newest first as ordered by the upstream.
    fn fetch_recent(&self, workflow_id: &str, limit: usize) -> Result<BreedBatch, ApiError>;

    /// The single most recent record, if any.
    fn fetch_summary(&self, workflow_id: &str) -> Result<Option<BreedRecord>, ApiError> {
        Ok(self.fetch_recent(workflow_id, 1)?.records.into_iter().next())
    }
}

impl<R: BreedRepository + ?Sized> BreedRepository for Box<R> {
    fn fetch_recent(&self, workflow_id: &str, limit: usize) -> Result<BreedBatch, ApiError> {
        (**self).fetch_recent(workflow_id, limit)
    }

    fn fetch_summary(&self, workflow_id: &str) -> Result<Option<BreedRecord>, ApiError> {
        (**self).fetch_summary(workflow_id)
    }
}

/// Repository for the integration selected in `config`, over `ureq`.
pub fn repository_for(config: &Config) -> Box<dyn BreedRepository> {
    repository_with(config, UreqTransport::new())
}

/// Repository for the integration selected in `config`, bound to that
/// integration's profile and sending through `transport`.
pub fn repository_with<'a, T>(config: &Config, transport: T) -> Box<dyn BreedRepository + 'a>
where
    T: Transport + 'a,
{
    let client = HttpClient::new(config.active_profile(), transport);
    match config.integration {
        Integration::Records => Box::new(DirectRecordRepository::new(client)),
        Integration::Runs => Box::new(RunLogRepository::new(client)),
    }
}

// ---------------------------------------------------------------------------
// Direct-record upstream
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DirectRecordRepository<T = UreqTransport> {
    client: HttpClient<T>,
}

impl<T: Transport> DirectRecordRepository<T> {
    pub fn new(client: HttpClient<T>) -> Self {
        Self { client }
    }

    /// Aggregate counts, optionally restricted to one workflow.
    pub fn stats(&self, workflow_id: Option<&str>) -> Result<BreedStats, ApiError> {
        let path = match workflow_id {
            Some(id) => format!("/api/breeds/stats?dag_id={}", urlencoding::encode(id)),
            None => "/api/breeds/stats".to_string(),
        };
        self.client.get_json(&path)
    }

    pub fn breed(&self, id: &str) -> Result<BreedRecord, ApiError> {
        let dto: BreedDto = self
            .client
            .get_json(&format!("/api/breeds/{}", urlencoding::encode(id)))?;
        dto.normalize()
            .map_err(|e| ApiError::UpstreamShapeMismatch(format!("breed {id}: {e}")))
    }

    /// Case-insensitive substring search on breed name.
    pub fn search(&self, name: &str, limit: usize) -> Result<BreedBatch, ApiError> {
        let path = format!("/api/breeds/search/{}?limit={limit}", urlencoding::encode(name));
        let body = self.get_lenient(&path)?;
        Ok(normalize_rows(body, &path))
    }

    pub fn health(&self) -> Result<HealthCheck, ApiError> {
        self.client.get_json("/health")
    }

    /// GET whose body is parsed as JSON if possible; a body that is not
    /// JSON at all comes back as `Value::Null` so the caller can coerce it.
    fn get_lenient(&self, path: &str) -> Result<Value, ApiError> {
        let response = self.client.request(path, &RequestOptions::default())?;
        Ok(serde_json::from_str(&response.body).unwrap_or_else(|e| {
            warn!(path, error = %e, "upstream body is not JSON");
            Value::Null
        }))
    }
}

impl<T: Transport> BreedRepository for DirectRecordRepository<T> {
    fn fetch_recent(&self, workflow_id: &str, limit: usize) -> Result<BreedBatch, ApiError> {
        let path = format!(
            "/api/breeds/recent?limit={limit}&dag_id={}",
            urlencoding::encode(workflow_id)
        );
        let body = self.get_lenient(&path)?;
        let batch = normalize_rows(body, &path);
        info!(
            workflow_id,
            records = batch.records.len(),
            skipped = batch.skipped_count(),
            "fetched recent breeds"
        );
        Ok(batch)
    }
}

fn normalize_rows(body: Value, path: &str) -> BreedBatch {
    let rows = match body {
        Value::Array(rows) => rows,
        other => {
            let mismatch = ApiError::UpstreamShapeMismatch(format!(
                "expected an array, got {}",
                json_kind(&other)
            ));
            warn!(path, error = %mismatch, "treating response as empty");
            return BreedBatch::default();
        }
    };

    let batch = BreedBatch::from_results(
        rows.into_iter()
            .enumerate()
            .map(|(index, row)| (row_key(&row, index), decode_row(row))),
    );
    for item in &batch.skipped {
        warn!(path, item = %item.key, reason = %item.reason, "dropping breed row");
    }
    batch
}

fn decode_row(row: Value) -> Result<BreedRecord, LookupError> {
    if !row.is_object() {
        return Err(LookupError::Malformed(format!("expected an object, got {}", json_kind(&row))));
    }
    serde_json::from_value::<BreedDto>(row)
        .map_err(|e| LookupError::Malformed(e.to_string()))?
        .normalize()
}

fn row_key(row: &Value, index: usize) -> String {
    ["run_id", "dag_run_id", "id"]
        .iter()
        .find_map(|field| row.get(field).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{index}"))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Workflow-run upstream
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RunLogRepository<T = UreqTransport> {
    client: HttpClient<T>,
}

impl<T: Transport> RunLogRepository<T> {
    pub fn new(client: HttpClient<T>) -> Self {
        Self { client }
    }

    /// Recent runs of `workflow_id`, newest first. Entries that cannot be
    /// read as a run come back as their own `Err`.
    pub fn list_runs(
        &self,
        workflow_id: &str,
        limit: usize,
    ) -> Result<Vec<Result<RunDescriptor, LookupError>>, ApiError> {
        let path = format!(
            "/workflows/{}/runs?limit={limit}&order_by=-start_date",
            urlencoding::encode(workflow_id)
        );
        let listing: Value = self.client.get_json(&path)?;
        Ok(RunList::from_value(listing)?.into_runs())
    }

    /// Reads one entry of a run's value store and decodes its `value`.
    pub fn run_value<D: DeserializeOwned>(
        &self,
        workflow_id: &str,
        run_id: &str,
        task: &str,
        key: &str,
    ) -> Result<D, ApiError> {
        let path = format!(
            "/workflows/{}/runs/{}/tasks/{}/values/{}",
            urlencoding::encode(workflow_id),
            urlencoding::encode(run_id),
            urlencoding::encode(task),
            urlencoding::encode(key),
        );
        let entry: RunValue = self.client.get_json(&path)?;
        let value = match entry.value {
            // Some orchestrator versions hand back the value JSON-encoded.
            Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
            other => other,
        };
        if !value.is_object() {
            return Err(ApiError::UpstreamShapeMismatch(format!(
                "{task}/{key} holds {}, expected an object",
                json_kind(&value)
            )));
        }
        serde_json::from_value(value).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Builds the record for one run from its summary value, or from the
    /// fetch step's return value when the summary is unavailable.
    pub fn record_for_run(&self, workflow_id: &str, run: &RunDescriptor) -> Result<BreedRecord, LookupError> {
        let summary = self
            .run_value::<BreedSummaryValue>(workflow_id, &run.run_id, SUMMARY_TASK, SUMMARY_KEY)
            .map(DerivedBreed::from)
            .and_then(|derived| {
                let named = derived
                    .breed_name
                    .as_deref()
                    .is_some_and(|name| !name.trim().is_empty());
                if named {
                    Ok(derived)
                } else {
                    Err(ApiError::UpstreamShapeMismatch(format!("{SUMMARY_KEY} has no breed_name")))
                }
            });

        let derived = match summary {
            Ok(derived) => derived,
            Err(summary_err) => {
                debug!(run_id = %run.run_id, error = %summary_err, "summary unavailable, using fetch result");
                self.run_value::<FetchResultValue>(workflow_id, &run.run_id, FETCH_TASK, FETCH_KEY)
                    .map(DerivedBreed::from)
                    .map_err(|fallback_err| LookupError::BothLookupsFailed {
                        summary: Box::new(summary_err),
                        fallback: Box::new(fallback_err),
                    })?
            }
        };

        derived.into_record(run)
    }
}

impl<T: Transport> BreedRepository for RunLogRepository<T> {
    fn fetch_recent(&self, workflow_id: &str, limit: usize) -> Result<BreedBatch, ApiError> {
        let runs = self.list_runs(workflow_id, limit)?;
        let listed = runs.len();
        let batch = BreedBatch::from_results(runs.into_iter().enumerate().map(|(index, entry)| match entry {
            Ok(run) => {
                let record = self.record_for_run(workflow_id, &run);
                (run.run_id, record)
            }
            Err(reason) => (format!("#{index}"), Err(reason)),
        }));
        for item in &batch.skipped {
            warn!(workflow_id, run_id = %item.key, reason = %item.reason, "skipping run");
        }
        info!(
            workflow_id,
            runs = listed,
            records = batch.records.len(),
            skipped = batch.skipped_count(),
            "fetched recent breeds from run log"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::{BasicAuth, UpstreamProfile};
    use crate::test_support::{response, ScriptedTransport};

    const API: &str = "http://localhost:30800";
    const WF: &str = "http://localhost:8080/api/v2";

    fn direct(transport: &ScriptedTransport) -> DirectRecordRepository<&ScriptedTransport> {
        DirectRecordRepository::new(HttpClient::new(&UpstreamProfile::new(API), transport))
    }

    fn run_log(transport: &ScriptedTransport) -> RunLogRepository<&ScriptedTransport> {
        let profile = UpstreamProfile::new(WF).with_auth(BasicAuth::new("admin", "admin"));
        RunLogRepository::new(HttpClient::new(&profile, transport))
    }

    fn recent_url(limit: usize) -> String {
        format!("{API}/api/breeds/recent?limit={limit}&dag_id=dog_breed_fetcher")
    }

    fn runs_url(limit: usize) -> String {
        format!("{WF}/workflows/dog_breed_fetcher/runs?limit={limit}&order_by=-start_date")
    }

    fn value_url(run: &str, task: &str, key: &str) -> String {
        format!("{WF}/workflows/dog_breed_fetcher/runs/{run}/tasks/{task}/values/{key}")
    }

    fn names(batch: &BreedBatch) -> Vec<&str> {
        batch.records.iter().map(|r| r.breed_name.as_str()).collect()
    }

    fn config(integration: Integration) -> Config {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.integration = integration;
        config
    }

    #[test]
    fn repository_with_follows_the_selected_integration() {
        let transport = ScriptedTransport::new().json(&recent_url(4), json!([{"breed_name": "Akita"}]));
        let batch = repository_with(&config(Integration::Records), &transport)
            .fetch_recent(DEFAULT_WORKFLOW_ID, 4)
            .unwrap();
        assert_eq!(names(&batch), ["Akita"]);
        let sent = transport.requests();
        assert_eq!(sent[0].url, recent_url(4));
        assert_eq!(sent[0].header("authorization"), None);

        let transport = ScriptedTransport::new()
            .json(&runs_url(4), json!({"dag_runs": [run("r1", "1")]}))
            .json(&value_url("r1", SUMMARY_TASK, SUMMARY_KEY), json!({"value": {"breed_name": "Husky"}}));
        let batch = repository_with(&config(Integration::Runs), &transport)
            .fetch_recent(DEFAULT_WORKFLOW_ID, 4)
            .unwrap();
        assert_eq!(names(&batch), ["Husky"]);
        let sent = transport.requests();
        assert_eq!(sent[0].url, runs_url(4));
        assert!(sent
            .iter()
            .all(|r| r.header("authorization") == Some("Basic YWRtaW46YWRtaW4=")));
    }

    // --- direct-record upstream ---

    #[test]
    fn direct_preserves_length_order_and_names() {
        let transport = ScriptedTransport::new().json(
            &recent_url(3),
            json!([
                {"breed_name": "Whippet", "life_span": "12-15 years", "run_id": "r3", "start_date": "2024-03-03T00:00:00", "state": "success"},
                {"breed_name": "Saluki", "life_expectancy": "10-17 years", "dag_run_id": "r2"},
                {"breed_name": "Vizsla ", "run_id": "r1"}
            ]),
        );
        let batch = direct(&transport).fetch_recent(DEFAULT_WORKFLOW_ID, 3).unwrap();
        assert_eq!(names(&batch), ["Whippet", "Saluki", "Vizsla "]);
        assert_eq!(batch.records[1].life_span.as_deref(), Some("10-17 years"));
        assert_eq!(batch.records[1].run_id.as_deref(), Some("r2"));
        assert_eq!(batch.skipped_count(), 0);
    }

    #[test]
    fn direct_non_array_body_is_empty_not_error() {
        let transport = ScriptedTransport::new().json(&recent_url(10), json!({"detail": "oops"}));
        let batch = direct(&transport).fetch_recent(DEFAULT_WORKFLOW_ID, 10).unwrap();
        assert!(batch.records.is_empty());

        let transport = ScriptedTransport::new().with(&recent_url(10), response(200, "<html></html>"));
        let batch = direct(&transport).fetch_recent(DEFAULT_WORKFLOW_ID, 10).unwrap();
        assert!(batch.records.is_empty());
    }

    #[test]
    fn direct_drops_rows_without_breed_name() {
        let transport = ScriptedTransport::new().json(
            &recent_url(10),
            json!([{"breed_name": "Akita"}, {"id": "x1", "breed_name": ""}, 42, {"breed_name": "Boxer"}]),
        );
        let batch = direct(&transport).fetch_recent(DEFAULT_WORKFLOW_ID, 10).unwrap();
        assert_eq!(names(&batch), ["Akita", "Boxer"]);
        assert_eq!(batch.skipped_count(), 2);
        assert_eq!(batch.skipped[0].key, "x1");
        assert!(matches!(batch.skipped[0].reason, LookupError::MissingBreedName));
        assert_eq!(batch.skipped[1].key, "#2");
        assert!(matches!(batch.skipped[1].reason, LookupError::Malformed(_)));
    }

    #[test]
    fn direct_encodes_workflow_id() {
        let transport = ScriptedTransport::new();
        let _ = direct(&transport).fetch_recent("dog breeds/v2", 5);
        assert_eq!(
            transport.urls(),
            [format!("{API}/api/breeds/recent?limit=5&dag_id=dog%20breeds%2Fv2")]
        );
    }

    #[test]
    fn direct_http_error_propagates_detail() {
        let transport = ScriptedTransport::new().with(
            &recent_url(10),
            response(500, r#"{"detail":"Failed to fetch recent breeds: db down"}"#),
        );
        let err = direct(&transport).fetch_recent(DEFAULT_WORKFLOW_ID, 10).unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch recent breeds: db down");
    }

    #[test]
    fn direct_summary_is_head_of_limit_one() {
        let transport = ScriptedTransport::new().json(&recent_url(1), json!([{"breed_name": "Pug"}]));
        let summary = direct(&transport).fetch_summary(DEFAULT_WORKFLOW_ID).unwrap();
        assert_eq!(summary.unwrap().breed_name, "Pug");

        let transport = ScriptedTransport::new().json(&recent_url(1), json!([]));
        assert!(direct(&transport).fetch_summary(DEFAULT_WORKFLOW_ID).unwrap().is_none());
    }

    #[test]
    fn direct_stats_breed_search_and_health() {
        let transport = ScriptedTransport::new()
            .json(
                &format!("{API}/api/breeds/stats?dag_id=dog_breed_fetcher"),
                json!({"total_breeds": 7, "unique_breeds": 5, "latest_execution": "2024-03-03T00:00:00"}),
            )
            .json(&format!("{API}/api/breeds/stats"), json!({"total_breeds": 9, "unique_breeds": 6}))
            .json(&format!("{API}/api/breeds/b-1"), json!({"id": "b-1", "breed_name": "Beagle"}))
            .json(
                &format!("{API}/api/breeds/search/golden%20retriever?limit=3"),
                json!([{"breed_name": "Golden Retriever"}]),
            )
            .json(&format!("{API}/health"), json!({"status": "healthy", "database": "connected", "timestamp": "t"}));
        let repo = direct(&transport);

        let stats = repo.stats(Some(DEFAULT_WORKFLOW_ID)).unwrap();
        assert_eq!((stats.total_breeds, stats.unique_breeds), (7, 5));
        assert!(repo.stats(None).unwrap().latest_execution.is_none());
        assert_eq!(repo.breed("b-1").unwrap().breed_name, "Beagle");
        assert_eq!(names(&repo.search("golden retriever", 3).unwrap()), ["Golden Retriever"]);
        assert!(repo.health().unwrap().is_healthy());
        assert!(repo.breed("missing").unwrap_err().is_not_found());
    }

    // --- workflow-run upstream ---

    fn run(id: &str, start: &str) -> Value {
        json!({"dag_run_id": id, "start_date": start, "state": "success"})
    }

    #[test]
    fn run_log_uses_summary_value() {
        let transport = ScriptedTransport::new()
            .json(&runs_url(10), json!({"dag_runs": [run("r1", "2024-01-01T00:00:00Z")]}))
            .json(
                &value_url("r1", SUMMARY_TASK, SUMMARY_KEY),
                json!({"value": {"breed_name": "Shiba Inu", "life_span": "13-16 years", "description": "Spirited", "message": "Random dog breed: Shiba Inu"}, "timestamp": "t"}),
            );
        let batch = run_log(&transport).fetch_recent(DEFAULT_WORKFLOW_ID, 10).unwrap();
        let record = &batch.records[0];
        assert_eq!(record.breed_name, "Shiba Inu");
        assert_eq!(record.life_span.as_deref(), Some("13-16 years"));
        assert_eq!(record.run_id.as_deref(), Some("r1"));
        assert_eq!(record.start_date.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(record.state.as_deref(), Some("success"));
        assert!(transport
            .requests()
            .iter()
            .all(|r| r.header("authorization") == Some("Basic YWRtaW46YWRtaW4=")));
    }

    #[test]
    fn run_log_falls_back_to_fetch_result_life_expectancy() {
        let transport = ScriptedTransport::new()
            .json(&runs_url(10), json!({"dag_runs": [run("r1", "2024-01-01")]}))
            .json(
                &value_url("r1", FETCH_TASK, FETCH_KEY),
                json!({"value": {"breed_name": "Borzoi", "life_expectancy": "9-14 years", "description": "Sighthound", "full_data": {"id": "x"}}}),
            );
        let batch = run_log(&transport).fetch_recent(DEFAULT_WORKFLOW_ID, 10).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].breed_name, "Borzoi");
        assert_eq!(batch.records[0].life_span.as_deref(), Some("9-14 years"));
        assert_eq!(batch.records[0].description.as_deref(), Some("Sighthound"));
    }

    #[test]
    fn run_log_skips_runs_failing_both_lookups_and_keeps_order() {
        let summary = |name: &str| json!({"value": {"breed_name": name, "life_span": "10 years"}});
        let transport = ScriptedTransport::new()
            .json(
                &runs_url(5),
                json!({"dag_runs": [run("r5", "5"), run("r4", "4"), run("r3", "3"), run("r2", "2"), run("r1", "1")]}),
            )
            .json(&value_url("r5", SUMMARY_TASK, SUMMARY_KEY), summary("Pointer"))
            .json(&value_url("r3", SUMMARY_TASK, SUMMARY_KEY), summary("Setter"))
            .failing(&value_url("r2", SUMMARY_TASK, SUMMARY_KEY), "connection reset")
            .json(&value_url("r1", SUMMARY_TASK, SUMMARY_KEY), summary("Spaniel"));
        let batch = run_log(&transport).fetch_recent(DEFAULT_WORKFLOW_ID, 5).unwrap();
        assert_eq!(names(&batch), ["Pointer", "Setter", "Spaniel"]);
        let skipped: Vec<_> = batch.skipped.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(skipped, ["r4", "r2"]);
        assert!(matches!(batch.skipped[0].reason, LookupError::BothLookupsFailed { .. }));
    }

    #[test]
    fn run_log_skips_entries_without_run_id() {
        let transport = ScriptedTransport::new()
            .json(
                &runs_url(3),
                json!({"dag_runs": [
                    {"run_id": "r2", "dag_run_id": "r2", "state": "success"},
                    {"run_id": null, "state": "failed"},
                    run("r1", "1")
                ]}),
            )
            .json(&value_url("r2", SUMMARY_TASK, SUMMARY_KEY), json!({"value": {"breed_name": "Basenji"}}))
            .json(&value_url("r1", SUMMARY_TASK, SUMMARY_KEY), json!({"value": {"breed_name": "Dingo"}}));
        let batch = run_log(&transport).fetch_recent(DEFAULT_WORKFLOW_ID, 3).unwrap();
        assert_eq!(names(&batch), ["Basenji", "Dingo"]);
        assert_eq!(batch.records[0].state.as_deref(), Some("success"));
        assert_eq!(batch.skipped_count(), 1);
        assert_eq!(batch.skipped[0].key, "#1");
        assert!(matches!(batch.skipped[0].reason, LookupError::MissingRunId));
    }

    #[test]
    fn run_log_lookups_are_sequential_per_run() {
        let transport = ScriptedTransport::new()
            .json(&runs_url(2), json!({"dag_runs": [run("a", "2"), run("b", "1")]}));
        let _ = run_log(&transport).fetch_recent(DEFAULT_WORKFLOW_ID, 2).unwrap();
        assert_eq!(
            transport.urls(),
            [
                runs_url(2),
                value_url("a", SUMMARY_TASK, SUMMARY_KEY),
                value_url("a", FETCH_TASK, FETCH_KEY),
                value_url("b", SUMMARY_TASK, SUMMARY_KEY),
                value_url("b", FETCH_TASK, FETCH_KEY),
            ]
        );
    }

    #[test]
    fn run_log_summary_without_name_uses_fallback() {
        let transport = ScriptedTransport::new()
            .json(&runs_url(1), json!([{"run_id": "r1"}]))
            .json(&value_url("r1", SUMMARY_TASK, SUMMARY_KEY), json!({"value": {"message": "nothing"}}))
            .json(&value_url("r1", FETCH_TASK, FETCH_KEY), json!({"value": {"breed_name": "Husky"}}));
        let record = run_log(&transport).fetch_summary(DEFAULT_WORKFLOW_ID).unwrap().unwrap();
        assert_eq!(record.breed_name, "Husky");
        assert!(record.state.is_none());
    }

    #[test]
    fn run_log_accepts_json_encoded_value() {
        let transport = ScriptedTransport::new()
            .json(&runs_url(1), json!({"dag_runs": [run("r1", "1")]}))
            .json(
                &value_url("r1", SUMMARY_TASK, SUMMARY_KEY),
                json!({"value": "{\"breed_name\": \"Samoyed\"}"}),
            );
        let batch = run_log(&transport).fetch_recent(DEFAULT_WORKFLOW_ID, 1).unwrap();
        assert_eq!(names(&batch), ["Samoyed"]);
    }

    #[test]
    fn run_log_encodes_run_ids() {
        let transport = ScriptedTransport::new()
            .json(&runs_url(1), json!({"dag_runs": [run("scheduled__2024-01-01T00:00:00+00:00", "1")]}));
        let batch = run_log(&transport).fetch_recent(DEFAULT_WORKFLOW_ID, 1).unwrap();
        assert_eq!(batch.skipped_count(), 1);
        assert_eq!(
            transport.urls()[1],
            value_url("scheduled__2024-01-01T00%3A00%3A00%2B00%3A00", SUMMARY_TASK, SUMMARY_KEY)
        );
    }

    #[test]
    fn run_log_listing_failure_propagates() {
        let transport = ScriptedTransport::new()
            .with(&runs_url(10), response(401, r#"{"detail":"Unauthorized"}"#));
        let err = run_log(&transport).fetch_recent(DEFAULT_WORKFLOW_ID, 10).unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.to_string(), "Unauthorized");

        let transport = ScriptedTransport::new().failing(&runs_url(10), "dns error");
        let err = run_log(&transport).fetch_recent(DEFAULT_WORKFLOW_ID, 10).unwrap_err();
        assert!(matches!(err, ApiError::NetworkUnavailable { .. }));
    }

    #[test]
    fn run_log_unknown_listing_shape_is_mismatch() {
        let transport = ScriptedTransport::new().json(&runs_url(10), json!({"items": []}));
        let err = run_log(&transport).fetch_recent(DEFAULT_WORKFLOW_ID, 10).unwrap_err();
        assert!(matches!(err, ApiError::UpstreamShapeMismatch(_)));
    }
}

mod common;

use futures::executor::block_on;
use futures::future::{self, LocalBoxFuture};
use std::cell::RefCell;
use std::collections::HashMap;

use common::{demo_editor, png_payload};
use prompt_world::describe::{validate_payload, StaticDescriber};
use prompt_world::export::{from_json, to_json};
use prompt_world::traits::{DescribeError, DescribeRequest, DescriptionService, QueryError, QueryService};
use prompt_world::{EditorConfig, ImagePayload, ObjectPlane, PlaneId, Scene, SceneStore};

/// Scripted service: answers per plane, records what it was asked
struct ScriptedService {
    answers: HashMap<PlaneId, Result<String, DescribeError>>,
    calls: RefCell<Vec<PlaneId>>,
}

impl ScriptedService {
    fn new() -> Self {
        Self {
            answers: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn answer(mut self, id: &PlaneId, result: Result<&str, DescribeError>) -> Self {
        self.answers.insert(id.clone(), result.map(str::to_string));
        self
    }
}

impl DescriptionService for ScriptedService {
    fn describe<'a>(&'a self, request: DescribeRequest<'a>) -> LocalBoxFuture<'a, Result<String, DescribeError>> {
        self.calls.borrow_mut().push(request.plane.clone());
        let answer = self
            .answers
            .get(request.plane)
            .cloned()
            .unwrap_or(Err(DescribeError::Network));
        Box::pin(future::ready(answer))
    }
}

/// Query service with one fixed reply; remembers the prompts it saw
struct FixedReply {
    reply: Result<String, QueryError>,
    prompts: RefCell<Vec<String>>,
}

impl FixedReply {
    fn new(reply: Result<&str, QueryError>) -> Self {
        Self {
            reply: reply.map(str::to_string),
            prompts: RefCell::new(Vec::new()),
        }
    }
}

impl QueryService for FixedReply {
    fn query<'a>(&'a self, prompt: &'a str) -> LocalBoxFuture<'a, Result<String, QueryError>> {
        self.prompts.borrow_mut().push(prompt.to_string());
        Box::pin(future::ready(self.reply.clone()))
    }
}

#[cfg(test)]
mod describe_tests {
    use super::*;

    #[test]
    fn test_batch_writes_every_outcome_and_persists_once() {
        let mut editor = demo_editor(EditorConfig::default());
        let ok = editor.import_image(png_payload());
        let limited = editor.import_image(png_payload());
        let blocked = editor.import_image(png_payload());
        let empty = editor.import_image(png_payload());
        let saves = editor.store().save_count();

        let service = ScriptedService::new()
            .answer(&ok, Ok("  A sunny beach.\n"))
            .answer(&limited, Err(DescribeError::RateLimited))
            .answer(&blocked, Err(DescribeError::Blocked("SAFETY".into())))
            .answer(&empty, Ok("   "));

        let report = block_on(editor.describe_all(&service));

        assert_eq!(report.requested, 4);
        assert_eq!(report.described, 1);
        assert_eq!(report.warnings, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.summary(), "Finished processing with 1 error(s) out of 4 images.");
        assert_eq!(editor.store().save_count(), saves + 1);

        let scene = editor.store().load(editor.scene().id()).unwrap();
        assert_eq!(scene.object(&ok).unwrap().description, "A sunny beach.");
        assert_eq!(
            scene.object(&limited).unwrap().description,
            "Error: API rate limit exceeded or quota finished. Please try again later."
        );
        assert_eq!(
            scene.object(&blocked).unwrap().description,
            "Warning: Processing blocked due to safety concerns."
        );
        assert!(scene.object(&empty).unwrap().description.starts_with("Warning: No description text returned"));
    }

    #[test]
    fn test_invalid_payloads_never_reach_the_service() {
        let mut editor = demo_editor(EditorConfig::default());
        let good = editor.import_image(png_payload());
        let text = editor.import_image(ImagePayload::new("text/plain", b"hello".to_vec()));
        let garbage = editor.import_image(ImagePayload::new("image/png", vec![0, 1, 2, 3]));

        let service = ScriptedService::new().answer(&good, Ok("A cat"));
        let report = block_on(editor.describe_all(&service));

        assert_eq!(*service.calls.borrow(), vec![good.clone()]);
        assert_eq!(report.failed, 2);
        let scene = editor.scene();
        assert_eq!(scene.object(&good).unwrap().description, "A cat");
        assert_eq!(scene.object(&text).unwrap().description, "Error: Invalid MIME type (text/plain).");
        assert_eq!(scene.object(&garbage).unwrap().description, "Error: Invalid image data format.");
    }

    #[test]
    fn test_unknown_ids_are_counted_missing() {
        let mut editor = demo_editor(EditorConfig::default());
        let id = editor.import_image(png_payload());
        let service = ScriptedService::new().answer(&id, Ok("A mug"));

        let report = block_on(editor.describe(&[id.clone(), PlaneId::from("ghost")], &service));
        assert_eq!(report.requested, 2);
        assert_eq!(report.described, 1);
        assert_eq!(report.missing, 1);
        assert!(!report.has_errors());
        assert_eq!(report.summary(), "Described 1 of 2 image(s).");
    }

    #[test]
    fn test_repeated_id_is_described_once() {
        let mut editor = demo_editor(EditorConfig::default());
        let id = editor.import_image(png_payload());
        let service = ScriptedService::new().answer(&id, Ok("A mug"));

        let report = block_on(editor.describe(&[id.clone(), id.clone()], &service));
        assert_eq!(*service.calls.borrow(), vec![id.clone()]);
        assert_eq!(report.requested, 1);
        assert_eq!(report.described, 1);
        assert_eq!(report.missing, 0);
        assert_eq!(report.summary(), "Described 1 of 1 image(s).");
    }

    #[test]
    fn test_reloaded_payload_measures_its_bytes() {
        let mut scene = Scene::new("Probe");
        let id = scene.push_object(ObjectPlane::new(png_payload()));
        let mut doc: serde_json::Value = serde_json::from_str(&to_json(&scene).unwrap()).unwrap();
        let image = &mut doc["scene"]["objects"][0]["image"];
        assert!(image.get("dimensions").is_none());
        image["dimensions"] = serde_json::json!([1, 1]);

        let reloaded = from_json(&doc.to_string()).unwrap();
        let payload = reloaded.object(&id).unwrap().image();
        assert_eq!(payload.dimensions(), Some([200, 150]));
        assert_eq!(validate_payload(payload), Ok(()));
    }

    #[test]
    fn test_forged_dimensions_do_not_pass_validation() {
        let mut scene = Scene::new("Forged");
        let id = scene.push_object(ObjectPlane::new(ImagePayload::new("image/png", vec![1, 2, 3])));
        let mut doc: serde_json::Value = serde_json::from_str(&to_json(&scene).unwrap()).unwrap();
        doc["scene"]["objects"][0]["image"]["dimensions"] = serde_json::json!([10, 10]);

        let reloaded = from_json(&doc.to_string()).unwrap();
        let payload = reloaded.object(&id).unwrap().image();
        assert_eq!(payload.dimensions(), None);
        assert_eq!(validate_payload(payload), Err(DescribeError::InvalidImageData));
    }

    #[test]
    fn test_failed_save_after_batch_is_a_notice() {
        let mut editor = demo_editor(EditorConfig::default());
        let id = editor.import_image(png_payload());
        editor.store_mut().set_fail_writes(true);

        let mut describer = StaticDescriber::default();
        describer.insert(id.as_str(), "A lamp");
        block_on(editor.describe_all(&describer));
        editor.poll_saves();

        assert_eq!(editor.scene().object(&id).unwrap().description, "A lamp");
        assert_eq!(editor.take_notices().len(), 1);
        assert!(editor.is_dirty());
    }

    #[test]
    fn test_static_describer_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("descriptions.json");
        std::fs::write(&path, r#"{"abcde": "From file"}"#).unwrap();

        let describer = StaticDescriber::from_file(&path).unwrap();
        let id = PlaneId::from("1700000000000abcde");
        let request = DescribeRequest { plane: &id, mime_type: "image/png", data: &[] };
        assert_eq!(block_on(describer.describe(request)), Ok("From file".to_string()));

        assert!(StaticDescriber::from_file(&dir.path().join("missing.json")).is_err());
    }
}

#[cfg(test)]
mod query_tests {
    use super::*;

    #[test]
    fn test_answer_comes_back_trimmed() {
        let mut editor = demo_editor(EditorConfig::default());
        let id = editor.import_image(png_payload());
        editor.set_description(&id, "A red door");
        let commits = editor.commit_count();

        let service = FixedReply::new(Ok("  The door faces the camera.\n"));
        let answer = block_on(editor.ask("Which way does the door face?", &service));

        assert_eq!(answer, Ok("The door faces the camera.".to_string()));
        let prompts = service.prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("A red door"));
        assert!(prompts[0].ends_with("User Query: \"Which way does the door face?\""));
        assert_eq!(editor.commit_count(), commits);
    }

    #[test]
    fn test_service_errors_reach_the_caller() {
        let mut editor = demo_editor(EditorConfig::default());
        editor.import_image(png_payload());

        let blocked = FixedReply::new(Err(QueryError::Blocked("SAFETY".into())));
        let err = block_on(editor.ask("Describe the room", &blocked)).unwrap_err();
        assert!(err.is_warning());
        assert_eq!(err.to_string(), "Warning: Prompt was blocked by the API. Reason: SAFETY.");

        let limited = FixedReply::new(Err(QueryError::RateLimited));
        assert_eq!(
            block_on(editor.ask("Describe the room", &limited)).unwrap_err().to_string(),
            "Error: API rate limit exceeded or quota finished. Please try again later."
        );

        let blank = FixedReply::new(Ok("   "));
        assert_eq!(block_on(editor.ask("Describe the room", &blank)), Err(QueryError::EmptyResponse));
    }

    #[test]
    fn test_empty_scene_is_not_sent() {
        let editor = demo_editor(EditorConfig::default());
        let service = FixedReply::new(Ok("unused"));
        assert_eq!(block_on(editor.ask("Anything here?", &service)), Err(QueryError::NoObjects));
        assert_eq!(block_on(editor.ask("   ", &service)), Err(QueryError::EmptyQuery));
        assert!(service.prompts.borrow().is_empty());
    }
}

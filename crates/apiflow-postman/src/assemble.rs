//! Collection assembly from built scenarios
//!
//! Every scenario becomes a folder, every step a request entry. Request and
//! folder ids are freshly generated UUIDs, so assembly takes the rng used by
//! the rest of the pipeline. The timestamp is passed in by the caller and
//! stamped on the collection and every request alike.

use apiflow_core::Config;
use apiflow_core::scenario::{Scenario, Step, StepBody};
use apiflow_core::synth::uuid_v4;
use rand::Rng;

use crate::collection::{Collection, Folder, HeaderEntry, QueryEntry, Request};
use crate::scripts::ScriptRenderer;

const HEADER_BLOCK: &str = "Accept: application/json\nContent-Type: application/json\n";

pub struct Assembler<'a> {
    config: &'a Config,
    timestamp: u64,
}

impl<'a> Assembler<'a> {
    #[must_use]
    pub fn new(config: &'a Config, timestamp: u64) -> Self {
        Self { config, timestamp }
    }

    /// Package scenarios into a collection named after the source document.
    pub fn assemble(
        &self,
        name: &str,
        description: &str,
        scenarios: &[Scenario],
        rng: &mut impl Rng,
    ) -> Collection {
        let collection_id = uuid_v4(rng);
        let renderer = ScriptRenderer::new(self.config);
        let mut folders = Vec::new();
        let mut requests = Vec::new();

        for scenario in scenarios {
            let mut folder = Folder {
                id: uuid_v4(rng),
                name: scenario.name.clone(),
                description: String::new(),
                collection_id: collection_id.clone(),
                order: Vec::new(),
                owner: self.config.owner,
                folders_order: Vec::new(),
            };
            for step in &scenario.steps {
                let request = self.request_for(step, &collection_id, &folder.id, &renderer, rng);
                folder.order.push(request.id.clone());
                requests.push(request);
            }
            folders.push(folder);
        }

        Collection {
            id: collection_id,
            name: name.to_string(),
            description: description.to_string(),
            order: Vec::new(),
            folders,
            folders_order: Vec::new(),
            timestamp: self.timestamp,
            owner: self.config.owner,
            public: false,
            requests,
        }
    }

    fn request_for(
        &self,
        step: &Step,
        collection_id: &str,
        folder_id: &str,
        renderer: &ScriptRenderer,
        rng: &mut impl Rng,
    ) -> Request {
        let raw_mode_data = match &step.body {
            StepBody::None => String::new(),
            StepBody::Json(value) => serde_json::to_string(value).unwrap_or_default(),
            StepBody::Template(template) => template.clone(),
        };
        Request {
            id: uuid_v4(rng),
            name: step.name.clone(),
            description: step.description.clone(),
            headers: HEADER_BLOCK.to_string(),
            header_data: vec![
                header_entry("Accept", "application/json"),
                header_entry("Content-Type", "application/json"),
            ],
            url: step.url.clone(),
            folder: folder_id.to_string(),
            query_params: step
                .query
                .iter()
                .map(|param| QueryEntry {
                    key: param.key.clone(),
                    value: param.value.clone(),
                    equals: true,
                    description: String::new(),
                    enabled: true,
                })
                .collect(),
            pre_request_script: renderer.render_pre_request(step),
            method: step.method.as_str().to_string(),
            data: Vec::new(),
            data_mode: "raw".to_string(),
            version: 2,
            tests: renderer.render_tests(step),
            current_helper: "normal".to_string(),
            time: self.timestamp,
            collection_id: collection_id.to_string(),
            raw_mode_data,
        }
    }
}

fn header_entry(key: &str, value: &str) -> HeaderEntry {
    HeaderEntry {
        key: key.to_string(),
        value: value.to_string(),
        description: String::new(),
        enabled: true,
    }
}

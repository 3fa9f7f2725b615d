//! Test-script rendering for the legacy Postman runtime
//!
//! Assertion descriptors map to `tests["..."] = ...;` lines in the classic
//! script dialect. Assertions that call a helper function get the helper's
//! body appended right after their first use, once per request. Captures
//! render last so the environment variables are set after all checks ran.

use apiflow_core::Config;
use apiflow_core::scenario::{Assertion, Capture, Step, UpdateBody};

pub struct ScriptRenderer<'a> {
    config: &'a Config,
}

impl<'a> ScriptRenderer<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Render the full test script of a step.
    #[must_use]
    pub fn render_tests(&self, step: &Step) -> String {
        let mut script = String::new();
        let mut emitted: Vec<Helper> = Vec::new();
        for assertion in &step.assertions {
            script.push_str(&self.assertion_line(assertion));
            if let Some(helper) = helper_for(assertion) {
                if !emitted.contains(&helper) {
                    emitted.push(helper);
                    script.push_str(helper.body());
                }
            }
        }
        for capture in &step.captures {
            script.push_str(capture_line(capture));
        }
        script
    }

    /// Render the pre-request script of a step, empty when it has none.
    #[must_use]
    pub fn render_pre_request(&self, step: &Step) -> String {
        match &step.pre_request {
            Some(UpdateBody { property, value }) => format!(
                "var modifiedRequest = JSON.parse(postman.getEnvironmentVariable(\"lastRequest\"));\n\
                 modifiedRequest[\"{property}\"] = \"{value}\";\n\
                 postman.setEnvironmentVariable(\"putBody\", JSON.stringify(modifiedRequest));\n"
            ),
            None => String::new(),
        }
    }

    fn assertion_line(&self, assertion: &Assertion) -> String {
        match assertion {
            Assertion::ContentTypePresent => concat!(
                "tests[\"Content-Type is present \" + postman.getResponseHeader(\"Content-type\")]",
                " = postman.getResponseHeader(\"Content-type\");\n"
            )
            .to_string(),
            Assertion::StatusCode(code) => {
                format!("tests[\"Status code is {code}\"] = responseCode.code === {code};\n")
            }
            Assertion::StatusIsError => {
                "tests[\"Status code is an error\"] = responseCode.code >= 400;\n".to_string()
            }
            Assertion::LocationHeaderPresent => {
                "tests[\"Response contains location header\"] = responseHeaders.hasOwnProperty(\"Location\");\n"
                    .to_string()
            }
            Assertion::LocationHeaderCorrect { path } => {
                let host = &self.config.host_variable;
                let prefix = &self.config.path_variable;
                format!(
                    "tests[\"Location header is correct\"] = responseHeaders.hasOwnProperty(\"Location\") &&\n\
                     \t(postman.getResponseHeader(\"Location\").toString() == environment[\"{prefix}\"] + \"{path}/\" + JSON.parse(responseBody).id || //relative\n\
                     \tpostman.getResponseHeader(\"Location\").toString() == environment[\"{host}\"] + environment[\"{prefix}\"] + \"{path}/\" + JSON.parse(responseBody).id);   //absolute\n"
                )
            }
            Assertion::RequiredFields { fields } => format!(
                "tests[\"Response contains all required fields\"] = findFieldsInBody({}, JSON.parse(responseBody));\n",
                json_array(fields)
            ),
            Assertion::BodyEqualsRequest => {
                "tests[\"POST Body Response equals Request Body\"] = objectEquals(JSON.parse(request.data), JSON.parse(responseBody));\n"
                    .to_string()
            }
            Assertion::BodyEqualsEnv { variable } => format!(
                "tests[\"POST Body Response equals Request Body\"] = objectEquals(JSON.parse(postman.getEnvironmentVariable(\"{variable}\")), JSON.parse(responseBody));\n"
            ),
            Assertion::ContainsCreated => {
                "tests[\"Response contains created resource\"] = findElementInList(postman.getEnvironmentVariable(\"lastId\"), JSON.parse(responseBody));\n"
                    .to_string()
            }
            Assertion::FieldValueInList { field, value } => format!(
                "tests[\"Each entry in result array has field with correct value\"] = checkFieldValueInArray(\"{field}\", \"{value}\", JSON.parse(responseBody));\n"
            ),
            Assertion::OnlyFields { fields } => format!(
                "tests[\"Response only contains chosen fields\"] = checkFieldsInArray({}, JSON.parse(responseBody));\n",
                json_array(fields)
            ),
        }
    }
}

fn capture_line(capture: &Capture) -> &'static str {
    match capture {
        Capture::LastId => {
            "postman.setEnvironmentVariable(\"lastId\", JSON.parse(responseBody).id);\n"
        }
        Capture::LastRequest => "postman.setEnvironmentVariable(\"lastRequest\", responseBody);\n",
    }
}

fn json_array(fields: &[String]) -> String {
    serde_json::to_string(fields).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Helper {
    ObjectEquals,
    FindElementInList,
    FindFieldsInBody,
    CheckFieldsInArray,
    CheckFieldValueInArray,
}

fn helper_for(assertion: &Assertion) -> Option<Helper> {
    match assertion {
        Assertion::RequiredFields { .. } => Some(Helper::FindFieldsInBody),
        Assertion::BodyEqualsRequest | Assertion::BodyEqualsEnv { .. } => {
            Some(Helper::ObjectEquals)
        }
        Assertion::ContainsCreated => Some(Helper::FindElementInList),
        Assertion::FieldValueInList { .. } => Some(Helper::CheckFieldValueInArray),
        Assertion::OnlyFields { .. } => Some(Helper::CheckFieldsInArray),
        _ => None,
    }
}

impl Helper {
    fn body(self) -> &'static str {
        match self {
            Helper::ObjectEquals => OBJECT_EQUALS,
            Helper::FindElementInList => FIND_ELEMENT_IN_LIST,
            Helper::FindFieldsInBody => FIND_FIELDS_IN_BODY,
            Helper::CheckFieldsInArray => CHECK_FIELDS_IN_ARRAY,
            Helper::CheckFieldValueInArray => CHECK_FIELD_VALUE_IN_ARRAY,
        }
    }
}

const FIND_ELEMENT_IN_LIST: &str = concat!(
    "\n",
    "function findElementInList(elementId,list) {\n",
    "\tfor (var i = 0; i < list.length; i++) {\n",
    "\t\tif (list[i].id == elementId) {\n",
    "\t\t\treturn true;\n",
    "\t\t}\n",
    "\t}\n",
    "\treturn false;\n",
    "}\n",
);

const FIND_FIELDS_IN_BODY: &str = concat!(
    "\n",
    "function findFieldInBody(field,body) {\n",
    "\tfor (var key in body) {\n",
    "\t\tif (key == field) return true;\n",
    "\t}\n",
    "\treturn false;\n",
    "}\n\n",
    "function findFieldsInBody(fields,body) {\n",
    "\tif (Object.prototype.toString.call(body) === \"[object Array]\") {\n",
    "\t\tfor (var i = 0; i < body.length; i++) {\n",
    "\t\t\tfindFieldsInBody(fields,body[i]);\n",
    "\t\t}\n",
    "\t} else {\n",
    "\t\tfor (var k = 0; k < fields.length; k++) {\n",
    "\t\t\tif (!findFieldInBody(fields[k],body)) {\n",
    "\t\t\t\ttests[\"An element is missing the field \" + fields[k]] = false;\n",
    "\t\t\t\treturn false;\n",
    "\t\t\t}\n",
    "\t\t}\n",
    "\t\treturn true\n",
    "\t}\n",
    "\treturn result;\n",
    "}\n",
);

const OBJECT_EQUALS: &str = concat!(
    "\n",
    "function objectEquals(v1, v2) {\n",
    "\tif (typeof(v1) === \"function\") {\n",
    "\t\treturn v1.toString() === v2.toString();\n",
    "\t} else if (v1 instanceof Object && v2 instanceof Object) {\n",
    "\t\tvar r = true;\n",
    "\t\tfor (var k in v1) {\n",
    "\t\t\tr = objectEquals(v1[k], v2[k]);\n",
    "\t\t\tif (!r) {\n",
    "\t\t\t\tconsole.log(\"v1:\"+JSON.stringify(v1));\n",
    "\t\t\t\tconsole.log(\"k:\"+k+\";v2:\"+JSON.stringify(v2));\n",
    "\t\t\t\tconsole.log(\"v1[k]:\"+v1[k]+\";v2[k]:\"+v2[k]);\n",
    "\t\t\t\tconsole.log(\"JSON.stringify(v1[k]):\"+JSON.stringify(v1[k])+\";JSON.stringify(v2[k]):\"+JSON.stringify(v2[k]));\n",
    "\t\t\t\tconsole.log(\"typeof(v1[k]):\"+typeof(v1[k])+\";typeof(v2[k]):\"+typeof(v2[k]));\n",
    "\t\t\t\treturn false;\n",
    "\t\t\t}\n",
    "\t\t}\n",
    "\t\treturn true;\n",
    "\t} else {\n",
    "\t\tif (v1 !== v2) {\n",
    "\t\t\tif (v1 === undefined || v2 === undefined) {\n",
    "\t\t\t\treturn false;\n",
    "\t\t\t} else {\n",
    "\t\t\t\treturn v1.toString() === v2.toString();\n",
    "\t\t\t}\n",
    "\t\t} else {\n",
    "\t\t\treturn true;\n",
    "\t\t}\n",
    "\t}\n",
    "}\n",
);

const CHECK_FIELDS_IN_ARRAY: &str = concat!(
    "\n",
    "function checkFieldsInArray(fields, body) {\n",
    "\tfor (var i = 0; i < body.length; i++) {\n",
    "\t\tif (!checkFields(fields,body[i])) {\n",
    "\t\t\treturn false;\n",
    "\t\t}\n",
    "\t}\n",
    "\treturn true;\n",
    "}\n\n",
    "function checkFields(fields,body) {\n",
    "\tfor (var key in body) {\n",
    "\t\tif (fields.indexOf(key) < 0) {\n",
    "\t\t\treturn false;\n",
    "\t\t} else {\n",
    "\t\t\ttests[key + \" exists\"] = true;\n",
    "\t\t}\n",
    "\t}\n",
    "\treturn true;\n",
    "}\n",
);

const CHECK_FIELD_VALUE_IN_ARRAY: &str = concat!(
    "\n",
    "function checkFieldValueInArray(field, value, body) {\n",
    "\tfor (var i = 0; i < body.length; i++) {\n",
    "\t\tif (!checkFieldValue(field, value, body[i])) {\n",
    "\t\t\treturn false;\n",
    "\t\t}\n",
    "\t}\n",
    "\treturn true;\n",
    "}\n\n",
    "function checkFieldValue(field, value,body) {\n",
    "\tfor (var key in body) {\n",
    "\t\tif (field.indexOf(\".\") >= 0) {\n",
    "\t\t\tif (field.substring(0, field.indexOf(\".\")) === key) {\n",
    "\t\t\t\tif(Array.isArray(body[key])) {\n",
    "\t\t\t\t\treturn checkFieldValueInArray(field.substring(field.indexOf(\".\") + 1), value, body[key]);\n",
    "\t\t\t\t} else if (typeof body[key] === \"object\") {\n",
    "\t\t\t\t\treturn checkFieldValue(field.substring(field.indexOf(\".\") + 1), value, body[key]);\n",
    "\t\t\t\t} else {\n",
    "\t\t\t\t\ttests[\"For complex filter values a complex attribute is needed\"] = false;\n",
    "\t\t\t\t}\n",
    "\t\t\t}\n",
    "\t\t} else {\n",
    "\t\t\tif (field === key) {\n",
    "\t\t\t\tif (body[key] !== value) {\n",
    "\t\t\t\t\tif (body[key] === undefined || value === undefined) {\n",
    "\t\t\t\t\t\treturn false;\n",
    "\t\t\t\t\t} else {\n",
    "\t\t\t\t\t\treturn body[key].toString() === value.toString();\n",
    "\t\t\t\t\t}\n",
    "\t\t\t\t} else {\n",
    "\t\t\t\t\treturn true;\n",
    "\t\t\t\t}\n",
    "\t\t\t}\n",
    "\t\t}\n",
    "\t}\n",
    "\ttests[\"field \" + field + \" found\"] = false;\n",
    "\treturn false;\n",
    "}\n",
);

#[cfg(test)]
mod tests {
    use super::*;
    use apiflow_core::scenario::Method;

    fn renderer_config() -> Config {
        Config::default()
    }

    fn step_with(assertions: Vec<Assertion>) -> Step {
        let mut step = Step::new("Create a pet", Method::Post, "{{host}}{{path}}/pets");
        step.assertions = assertions;
        step
    }

    #[test]
    fn content_type_line_matches_legacy_dialect() {
        let config = renderer_config();
        let renderer = ScriptRenderer::new(&config);
        let script = renderer.render_tests(&step_with(vec![Assertion::ContentTypePresent]));
        assert_eq!(
            script,
            "tests[\"Content-Type is present \" + postman.getResponseHeader(\"Content-type\")] = postman.getResponseHeader(\"Content-type\");\n"
        );
    }

    #[test]
    fn status_lines_render_code_and_error_forms() {
        let config = renderer_config();
        let renderer = ScriptRenderer::new(&config);

        let script = renderer.render_tests(&step_with(vec![
            Assertion::StatusCode(201),
            Assertion::StatusIsError,
        ]));
        assert!(script.contains("tests[\"Status code is 201\"] = responseCode.code === 201;\n"));
        assert!(script.contains("tests[\"Status code is an error\"] = responseCode.code >= 400;\n"));
    }

    #[test]
    fn location_script_uses_configured_variables() {
        let config = renderer_config();
        let renderer = ScriptRenderer::new(&config);
        let script = renderer.render_tests(&step_with(vec![Assertion::LocationHeaderCorrect {
            path: "/pets".to_string(),
        }]));

        assert!(script.contains("environment[\"path\"] + \"/pets/\""));
        assert!(script.contains("environment[\"host\"] + environment[\"path\"] + \"/pets/\""));
        assert!(script.contains("|| //relative\n"));
        assert!(script.ends_with(";   //absolute\n"));
    }

    #[test]
    fn helper_body_appended_once_after_first_use() {
        let config = renderer_config();
        let renderer = ScriptRenderer::new(&config);
        let script = renderer.render_tests(&step_with(vec![
            Assertion::BodyEqualsEnv {
                variable: "putBody".to_string(),
            },
            Assertion::BodyEqualsRequest,
        ]));

        assert_eq!(script.matches("function objectEquals(v1, v2)").count(), 1);
        let use_at = script.find("objectEquals(JSON.parse(postman").unwrap();
        let body_at = script.find("function objectEquals").unwrap();
        assert!(use_at < body_at);
    }

    #[test]
    fn required_fields_renders_json_array() {
        let config = renderer_config();
        let renderer = ScriptRenderer::new(&config);
        let script = renderer.render_tests(&step_with(vec![Assertion::RequiredFields {
            fields: vec!["name".to_string(), "id".to_string(), "href".to_string()],
        }]));

        assert!(script.contains(
            "findFieldsInBody([\"name\",\"id\",\"href\"], JSON.parse(responseBody));\n"
        ));
        assert!(script.contains("function findFieldsInBody(fields,body)"));
    }

    #[test]
    fn captures_render_after_assertions() {
        let config = renderer_config();
        let renderer = ScriptRenderer::new(&config);
        let mut step = step_with(vec![Assertion::StatusCode(201)]);
        step.captures = vec![Capture::LastId, Capture::LastRequest];
        let script = renderer.render_tests(&step);

        assert!(script.ends_with(
            "postman.setEnvironmentVariable(\"lastId\", JSON.parse(responseBody).id);\n\
             postman.setEnvironmentVariable(\"lastRequest\", responseBody);\n"
        ));
    }

    #[test]
    fn pre_request_renders_body_update() {
        let config = renderer_config();
        let renderer = ScriptRenderer::new(&config);
        let mut step = step_with(Vec::new());
        step.pre_request = Some(UpdateBody {
            property: "name".to_string(),
            value: "Hello".to_string(),
        });

        let script = renderer.render_pre_request(&step);
        assert_eq!(
            script,
            "var modifiedRequest = JSON.parse(postman.getEnvironmentVariable(\"lastRequest\"));\n\
             modifiedRequest[\"name\"] = \"Hello\";\n\
             postman.setEnvironmentVariable(\"putBody\", JSON.stringify(modifiedRequest));\n"
        );
    }

    #[test]
    fn step_without_pre_request_renders_empty() {
        let config = renderer_config();
        let renderer = ScriptRenderer::new(&config);
        assert_eq!(renderer.render_pre_request(&step_with(Vec::new())), "");
    }

    #[test]
    fn filter_assertion_quotes_field_and_value() {
        let config = renderer_config();
        let renderer = ScriptRenderer::new(&config);
        let script = renderer.render_tests(&step_with(vec![Assertion::FieldValueInList {
            field: "name".to_string(),
            value: "Rex".to_string(),
        }]));

        assert!(script.contains(
            "checkFieldValueInArray(\"name\", \"Rex\", JSON.parse(responseBody));\n"
        ));
        assert!(script.contains("function checkFieldValue(field, value,body)"));
    }
}

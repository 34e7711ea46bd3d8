//! One method per Shapeways API operation.
//!
//! Each call expands the path of its [`Endpoint`], checks the required keys
//! before anything is sent and hands the decoded body back untouched.
use http::Method;
use serde_json::Value;

use crate::{request::Endpoint, transport::Transport, Client, Params, Result};

const UPLOAD_KEYS: &[&str] = &["file", "fileName", "hasRightsToModel", "acceptTermsAndConditions"];

pub const API_INFO: Endpoint = Endpoint {
    method: Method::GET,
    path: "/api/",
    required: &[],
};
pub const GET_CART: Endpoint = Endpoint {
    method: Method::GET,
    path: "/orders/cart/",
    required: &[],
};
pub const ADD_TO_CART: Endpoint = Endpoint {
    method: Method::POST,
    path: "/orders/cart/",
    required: &["modelId"],
};
pub const GET_CATEGORIES: Endpoint = Endpoint {
    method: Method::GET,
    path: "/categories/",
    required: &[],
};
pub const GET_CATEGORY: Endpoint = Endpoint {
    method: Method::GET,
    path: "/categories/{}/",
    required: &[],
};
pub const GET_MATERIALS: Endpoint = Endpoint {
    method: Method::GET,
    path: "/materials/",
    required: &[],
};
pub const GET_MATERIAL: Endpoint = Endpoint {
    method: Method::GET,
    path: "/materials/{}/",
    required: &[],
};
pub const GET_MODELS: Endpoint = Endpoint {
    method: Method::GET,
    path: "/models/",
    required: &[],
};
pub const GET_MODEL: Endpoint = Endpoint {
    method: Method::GET,
    path: "/models/{}/",
    required: &[],
};
pub const ADD_MODEL: Endpoint = Endpoint {
    method: Method::POST,
    path: "/models/",
    required: UPLOAD_KEYS,
};
pub const DELETE_MODEL: Endpoint = Endpoint {
    method: Method::DELETE,
    path: "/models/{}/",
    required: &[],
};
pub const GET_MODEL_INFO: Endpoint = Endpoint {
    method: Method::GET,
    path: "/models/{}/info/",
    required: &[],
};
pub const UPDATE_MODEL_INFO: Endpoint = Endpoint {
    method: Method::PUT,
    path: "/models/{}/info/",
    required: &[],
};
pub const GET_MODEL_FILE: Endpoint = Endpoint {
    method: Method::GET,
    path: "/models/{}/files/{}/",
    required: &[],
};
pub const UPDATE_MODEL_FILE: Endpoint = Endpoint {
    method: Method::POST,
    path: "/models/{}/files/",
    required: UPLOAD_KEYS,
};
pub const ADD_MODEL_PHOTO: Endpoint = Endpoint {
    method: Method::POST,
    path: "/models/{}/photos/",
    required: &["file"],
};
pub const GET_PRICE: Endpoint = Endpoint {
    method: Method::POST,
    path: "/price/",
    required: &[
        "volume",
        "area",
        "xBoundMin",
        "xBoundMax",
        "yBoundMin",
        "yBoundMax",
        "zBoundMin",
        "zBoundMax",
    ],
};
pub const GET_PRINTERS: Endpoint = Endpoint {
    method: Method::GET,
    path: "/printers/",
    required: &[],
};
pub const GET_PRINTER: Endpoint = Endpoint {
    method: Method::GET,
    path: "/printers/{}/",
    required: &[],
};

impl<T: Transport> Client<T> {
    fn call(&mut self, endpoint: &Endpoint, ids: &[u64], params: &Params) -> Option<Value> {
        let url = self.url(&endpoint.path(ids));
        self.signed_request(endpoint.method.clone(), &url, params)
    }

    fn call_checked(
        &mut self,
        endpoint: &Endpoint,
        ids: &[u64],
        params: Params,
    ) -> Result<Option<Value>> {
        endpoint.check(&params)?;
        Ok(self.call(endpoint, ids, &params))
    }

    pub fn get_api_info(&mut self) -> Option<Value> {
        self.call(&API_INFO, &[], &Params::new())
    }

    pub fn get_cart(&mut self) -> Option<Value> {
        self.call(&GET_CART, &[], &Params::new())
    }

    /// Requires `modelId`; `materialId` and `quantity` are optional.
    pub fn add_to_cart(&mut self, params: Params) -> Result<Option<Value>> {
        self.call_checked(&ADD_TO_CART, &[], params)
    }

    pub fn get_categories(&mut self) -> Option<Value> {
        self.call(&GET_CATEGORIES, &[], &Params::new())
    }

    pub fn get_category(&mut self, category_id: u64) -> Option<Value> {
        self.call(&GET_CATEGORY, &[category_id], &Params::new())
    }

    pub fn get_materials(&mut self) -> Option<Value> {
        self.call(&GET_MATERIALS, &[], &Params::new())
    }

    pub fn get_material(&mut self, material_id: u64) -> Option<Value> {
        self.call(&GET_MATERIAL, &[material_id], &Params::new())
    }

    /// One page of the user's models.
    pub fn get_models(&mut self, page: u32) -> Option<Value> {
        self.call(&GET_MODELS, &[], &Params::new().field("page", page))
    }

    pub fn get_model(&mut self, model_id: u64) -> Option<Value> {
        self.call(&GET_MODEL, &[model_id], &Params::new())
    }

    /// Upload a new model. `file` holds the raw model data.
    pub fn add_model(&mut self, params: Params) -> Result<Option<Value>> {
        self.call_checked(&ADD_MODEL, &[], params.file_as_binary())
    }

    pub fn delete_model(&mut self, model_id: u64) -> Option<Value> {
        self.call(&DELETE_MODEL, &[model_id], &Params::new())
    }

    pub fn get_model_info(&mut self, model_id: u64) -> Option<Value> {
        self.call(&GET_MODEL_INFO, &[model_id], &Params::new())
    }

    pub fn update_model_info(&mut self, model_id: u64, params: Params) -> Option<Value> {
        self.call(&UPDATE_MODEL_INFO, &[model_id], &params)
    }

    /// With `include_file` the model data is part of the answer.
    pub fn get_model_file(
        &mut self,
        model_id: u64,
        file_version: u64,
        include_file: bool,
    ) -> Option<Value> {
        let params = Params::new().field("file", if include_file { 1 } else { 0 });
        self.call(&GET_MODEL_FILE, &[model_id, file_version], &params)
    }

    pub fn update_model_file(&mut self, model_id: u64, params: Params) -> Result<Option<Value>> {
        self.call_checked(&UPDATE_MODEL_FILE, &[model_id], params.file_as_binary())
    }

    pub fn add_model_photo(&mut self, model_id: u64, params: Params) -> Result<Option<Value>> {
        self.call_checked(&ADD_MODEL_PHOTO, &[model_id], params.file_as_binary())
    }

    /// Price a model from its volume, area and bounding box.
    pub fn get_price(&mut self, params: Params) -> Result<Option<Value>> {
        self.call_checked(&GET_PRICE, &[], params)
    }

    pub fn get_printers(&mut self) -> Option<Value> {
        self.call(&GET_PRINTERS, &[], &Params::new())
    }

    pub fn get_printer(&mut self, printer_id: u64) -> Option<Value> {
        self.call(&GET_PRINTER, &[printer_id], &Params::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::encode_file;
    use crate::testing::RecordingTransport;
    use crate::Error;
    use serde_json::json;

    fn client(transport: RecordingTransport) -> Client<RecordingTransport> {
        Client::builder("ck", "cs")
            .token("at", "as")
            .build_with_transport(transport)
            .unwrap()
    }

    fn full(keys: &[&str]) -> Params {
        keys.iter().map(|k| (*k, json!(1))).collect()
    }

    fn without(keys: &[&str], missing: &str) -> Params {
        keys.iter()
            .filter(|k| **k != missing)
            .map(|k| (*k, json!(1)))
            .collect()
    }

    fn assert_missing(result: Result<Option<Value>>, key: &str) {
        match result {
            Err(Error::MissingParameter(missing)) => assert_eq!(missing, key),
            other => panic!("expected missing {}, got {:?}", key, other),
        }
    }

    #[test]
    fn every_required_key_is_checked_before_sending() {
        let mut client = client(RecordingTransport::new());
        for key in ADD_TO_CART.required {
            assert_missing(client.add_to_cart(without(ADD_TO_CART.required, key)), key);
        }
        for key in UPLOAD_KEYS {
            assert_missing(client.add_model(without(UPLOAD_KEYS, key)), key);
            assert_missing(client.update_model_file(9, without(UPLOAD_KEYS, key)), key);
        }
        assert_missing(client.add_model_photo(9, Params::new()), "file");
        for key in GET_PRICE.required {
            assert_missing(client.get_price(without(GET_PRICE.required, key)), key);
        }
        assert_eq!(client.transport().requests().len(), 0);
    }

    #[test]
    fn first_missing_key_is_reported() {
        let mut client = client(RecordingTransport::new());
        assert_missing(client.get_price(Params::new()), "volume");
        assert_missing(
            client.get_price(full(&["volume", "area", "yBoundMin"])),
            "xBoundMin",
        );
    }

    #[test]
    fn add_model_uploads_encoded_file() {
        let mut client = client(RecordingTransport::new().respond(200, r#"{"modelId":1}"#));
        let bytes = b"solid cube\n\xff\xfe endsolid".to_vec();
        let params = Params::new()
            .field("fileName", "cube.stl")
            .field("hasRightsToModel", 1)
            .field("acceptTermsAndConditions", 1)
            .field("title", "Cube")
            .file(bytes.clone());
        let answer = client.add_model(params).unwrap();
        assert_eq!(answer, Some(json!({"modelId": 1})));

        let request = &client.transport().requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url.as_str(), "https://api.shapeways.com/models/v1");
        let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["file"], json!(encode_file(&bytes)));
        assert_eq!(body["fileName"], json!("cube.stl"));
        assert_eq!(body["title"], json!("Cube"));
    }

    #[test]
    fn textual_file_is_encoded_as_its_bytes() {
        let mut client = client(RecordingTransport::new().respond(200, "{}"));
        let params = Params::new()
            .field("file", "solid a")
            .field("fileName", "a.stl")
            .field("hasRightsToModel", 1)
            .field("acceptTermsAndConditions", 1);
        client.update_model_file(5, params).unwrap();

        let request = &client.transport().requests()[0];
        assert_eq!(request.url.as_str(), "https://api.shapeways.com/models/5/files/v1");
        let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["file"], json!(encode_file(b"solid a")));
    }

    #[test]
    fn add_model_photo_posts_to_photos() {
        let mut client = client(RecordingTransport::new().respond(200, "{}"));
        client
            .add_model_photo(12, Params::new().file(vec![1u8, 2, 3]).field("title", "front"))
            .unwrap();
        let request = &client.transport().requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url.as_str(), "https://api.shapeways.com/models/12/photos/v1");
    }

    #[test]
    fn simple_paths_and_verbs() {
        let transport = (0..11).fold(RecordingTransport::new(), |t, _| t.respond(200, "{}"));
        let mut client = client(transport);
        client.get_api_info();
        client.get_cart();
        client.get_categories();
        client.get_category(3);
        client.get_materials();
        client.get_material(6);
        client.get_model(7);
        client.delete_model(7);
        client.get_model_info(7);
        client.get_printers();
        client.get_printer(2);

        let seen = client
            .transport()
            .requests()
            .iter()
            .map(|r| (r.method.clone(), r.url.path().to_string()))
            .collect::<Vec<_>>();
        assert_eq!(
            seen,
            vec![
                (Method::GET, "/api/v1".to_string()),
                (Method::GET, "/orders/cart/v1".to_string()),
                (Method::GET, "/categories/v1".to_string()),
                (Method::GET, "/categories/3/v1".to_string()),
                (Method::GET, "/materials/v1".to_string()),
                (Method::GET, "/materials/6/v1".to_string()),
                (Method::GET, "/models/7/v1".to_string()),
                (Method::DELETE, "/models/7/v1".to_string()),
                (Method::GET, "/models/7/info/v1".to_string()),
                (Method::GET, "/printers/v1".to_string()),
                (Method::GET, "/printers/2/v1".to_string()),
            ]
        );
    }

    #[test]
    fn query_carrying_reads() {
        let mut client = client(
            RecordingTransport::new()
                .respond(200, "{}")
                .respond(200, "{}")
                .respond(200, "{}"),
        );
        client.get_models(2);
        client.get_model_file(7, 3, true);
        client.get_model_file(7, 3, false);
        let urls = client
            .transport()
            .requests()
            .iter()
            .map(|r| r.url.as_str().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            urls,
            vec![
                "https://api.shapeways.com/models/v1?page=2",
                "https://api.shapeways.com/models/7/files/3/v1?file=1",
                "https://api.shapeways.com/models/7/files/3/v1?file=0",
            ]
        );
    }

    #[test]
    fn writes_send_json() {
        let mut client = client(
            RecordingTransport::new()
                .respond(200, r#"{"result":"success"}"#)
                .respond(200, r#"{"result":"success"}"#)
                .respond(200, r#"{"prices":{}}"#),
        );
        client.update_model_info(7, Params::new().field("title", "Renamed"));
        client
            .add_to_cart(Params::new().field("modelId", 7).field("quantity", 1))
            .unwrap();
        let price = client
            .get_price(full(GET_PRICE.required))
            .unwrap();
        assert_eq!(price, Some(json!({"prices": {}})));

        let requests = client.transport().requests();
        assert_eq!(requests[0].method, Method::PUT);
        assert_eq!(requests[0].url.path(), "/models/7/info/v1");
        assert_eq!(requests[0].body.as_deref(), Some(r#"{"title":"Renamed"}"#));
        assert_eq!(requests[1].url.path(), "/orders/cart/v1");
        assert_eq!(requests[2].url.path(), "/price/v1");
        let body: Value = serde_json::from_str(requests[2].body.as_deref().unwrap()).unwrap();
        assert_eq!(body.as_object().unwrap().len(), GET_PRICE.required.len());
    }
}

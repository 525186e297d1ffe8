use actix_web::HttpResponse;
use serde::Serialize;

/// Success envelope: `{"status":"success","data":...}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }

    pub fn ok(data: T) -> HttpResponse {
        HttpResponse::Ok().json(Self::new(data))
    }

    pub fn created(data: T) -> HttpResponse {
        HttpResponse::Created().json(Self::new(data))
    }
}

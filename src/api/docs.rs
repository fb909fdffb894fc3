// API documentation - OpenAPI document and Swagger UI page

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde_json::{json, Value};

use super::response::json_response;
use super::types::NOT_FOUND_MSG;
use crate::http;

/// Serve the Swagger UI page; it loads `openapi.json` next to its own path
pub fn serve_docs_page() -> Response<Full<Bytes>> {
    http::build_html_response(include_str!("docs.html"))
}

/// Serve the OpenAPI document
pub fn serve_openapi() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &openapi_document())
}

fn course_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "description": description,
        "properties": {
            "id": {
                "type": "string",
                "description": "Especifica el ID del curso",
                "example": "8108277"
            },
            "name": {
                "type": "string",
                "description": "Hace referencia al nombre del curso",
                "example": "Electiva-II"
            },
            "credits": {
                "type": "integer",
                "description": "Especifica el número de créditos del curso",
                "example": 3
            }
        }
    })
}

fn course_ref() -> Value {
    json!({ "$ref": "#/components/schemas/Course" })
}

fn json_content(schema: Value) -> Value {
    json!({ "application/json": { "schema": schema } })
}

fn list_operation() -> Value {
    let envelope = json!({
        "type": "object",
        "properties": {
            "state": {
                "type": "boolean",
                "description": "Indica éxito en la consulta de los datos"
            },
            "data": { "type": "array", "items": course_ref() }
        }
    });
    json!({
        "summary": "Lista de Cursos",
        "description": "Método que retorna una colección de cursos",
        "responses": {
            "200": {
                "description": "Respuesta satisfactoria.",
                "content": json_content(envelope)
            },
            "501": {
                "description": "Error",
                "content": {
                    "text/plain": {
                        "schema": { "type": "string", "example": "Oh!! Algo ha pasado" }
                    }
                }
            }
        }
    })
}

fn create_operation() -> Value {
    json!({
        "summary": "Crea un Nuevo curso",
        "requestBody": {
            "description": "Inserta un nuevo registro",
            "required": true,
            "content": json_content(course_ref())
        },
        "responses": {
            "201": { "description": "SUCCESS", "content": json_content(course_ref()) }
        }
    })
}

fn get_operation() -> Value {
    let found = json!({
        "type": "object",
        "properties": {
            "state": {
                "type": "boolean",
                "description": "Indica que el objeto se encuentra o no."
            },
            "data": course_ref()
        }
    });
    let missing = json!({
        "type": "object",
        "properties": {
            "state": {
                "type": "boolean",
                "description": "Indica que el objeto no existe",
                "example": false
            },
            "msg": {
                "type": "string",
                "description": "Mensaje de Error",
                "example": NOT_FOUND_MSG
            }
        }
    });
    json!({
        "summary": "Recuperar un curso por ID",
        "description": "Realiza una búsqueda por ID",
        "parameters": [{
            "in": "path",
            "name": "id",
            "required": true,
            "schema": { "type": "string" },
            "description": "Id del curso para recuperar el objeto"
        }],
        "responses": {
            "201": { "description": "OK", "content": json_content(found) },
            "401": { "description": "NOT FOUND", "content": json_content(missing) }
        }
    })
}

/// Hand-authored OpenAPI 3.0 description of the course endpoints
pub fn openapi_document() -> Value {
    json!({
        "openapi": "3.0.0",
        "info": {
            "title": "Cursos API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Colección de cursos en memoria"
        },
        "paths": {
            "/": { "get": list_operation(), "post": create_operation() },
            "/{id}": { "get": get_operation() }
        },
        "components": {
            "schemas": { "Course": course_schema("Curso académico") }
        }
    })
}

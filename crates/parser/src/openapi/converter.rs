//! Converts an OpenAPI document to the operation IR

use super::types::{
    OpenApiSpec, Operation, Parameter, PathItem, Response, Schema, SchemaType, SpecVersion,
};
use crate::name_resolver::{NameCandidate, NameResolver};
use crate::type_mapper::TypeMapper;
use clientgen_common::{
    ApiDefinition, ContentKind, HttpMethod, MediaSpec, Operation as IrOperation, ParamLocation,
    Parameter as IrParameter, RequestContent, ResponseSpec, Result, SchemaKind, StatusKey,
};
use std::collections::BTreeMap;

const DEFAULT_MEDIA_TYPE: &str = "application/json";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

/// Convert an OpenAPI document to an [`ApiDefinition`]
pub fn convert_openapi_to_api_definition(spec: &OpenApiSpec) -> Result<ApiDefinition> {
    let version = spec.version()?;
    let mut mapper = TypeMapper::new(spec.schemas());
    mapper.map_components()?;

    let mut operations = Vec::new();
    for (path, item) in &spec.paths {
        for method in HttpMethod::ALL {
            if let Some(op) = item.operation(method) {
                let converted =
                    convert_operation(spec, version, &mut mapper, path, method, item, op)?;
                operations.push(converted);
            }
        }
    }

    let candidates: Vec<NameCandidate> = operations
        .iter()
        .map(|op| NameCandidate {
            explicit: op.operation_id.as_deref(),
            method: op.method,
            path: &op.path,
        })
        .collect();
    let ids = NameResolver::resolve(&candidates)?;
    for (op, id) in operations.iter_mut().zip(ids) {
        op.id = id;
    }

    tracing::debug!(
        operations = operations.len(),
        types = mapper.graph().len(),
        "normalized OpenAPI document"
    );

    Ok(ApiDefinition {
        kind: SchemaKind::OpenApi,
        title: spec.info.title.clone(),
        version: spec.info.version.clone(),
        servers: servers(spec, version),
        operations,
        types: mapper.into_graph(),
        graphql: None,
    })
}

fn servers(spec: &OpenApiSpec, version: SpecVersion) -> Vec<String> {
    match version {
        SpecVersion::OpenApi3 => spec.servers.iter().map(|s| s.url.clone()).collect(),
        SpecVersion::Swagger2 => {
            let base_path = spec.base_path.as_deref().unwrap_or_default();
            match &spec.host {
                Some(host) if spec.schemes.is_empty() => {
                    vec![format!("https://{}{}", host, base_path)]
                }
                Some(host) => spec
                    .schemes
                    .iter()
                    .map(|scheme| format!("{}://{}{}", scheme, host, base_path))
                    .collect(),
                None if !base_path.is_empty() => vec![base_path.to_string()],
                None => vec![],
            }
        }
    }
}

/// Body collected while walking parameters and `requestBody`
struct BodySpec {
    content: RequestContent,
    parameter: IrParameter,
}

fn convert_operation(
    spec: &OpenApiSpec,
    version: SpecVersion,
    mapper: &mut TypeMapper<'_>,
    path: &str,
    method: HttpMethod,
    item: &PathItem,
    op: &Operation,
) -> Result<IrOperation> {
    let merged = merge_parameters(spec, &item.parameters, &op.parameters)?;

    let mut parameters = Vec::new();
    let mut form_fields: Vec<&Parameter> = Vec::new();
    let mut body: Option<BodySpec> = None;

    for param in merged {
        let location = match param.location.as_str() {
            "path" => ParamLocation::Path,
            "query" => ParamLocation::Query,
            "header" => ParamLocation::Header,
            "body" => {
                let ty = mapper.map_schema(&param.value_schema())?;
                body = Some(BodySpec {
                    content: RequestContent {
                        kind: ContentKind::Json,
                        media_type: consumed_media_type(spec, op),
                    },
                    parameter: body_parameter(ty, param.required),
                });
                continue;
            }
            "formData" => {
                form_fields.push(param);
                continue;
            }
            other => {
                tracing::debug!(parameter = %param.name, location = other, "skipping parameter");
                continue;
            }
        };
        let ty = mapper.map_schema(&param.value_schema())?;
        parameters.push(IrParameter {
            name: param.name.clone(),
            location,
            required: param.required || location == ParamLocation::Path,
            ty,
            description: param.description.clone(),
        });
    }

    // Every placeholder of the template must be a declared path parameter
    for name in template_params(path) {
        let declared = parameters
            .iter()
            .any(|p| p.location == ParamLocation::Path && p.name == name);
        if !declared {
            let ty = mapper_string(mapper)?;
            parameters.push(IrParameter {
                name,
                location: ParamLocation::Path,
                required: true,
                ty,
                description: None,
            });
        }
    }

    if !form_fields.is_empty() {
        body = Some(form_body(spec, op, mapper, &form_fields)?);
    }
    if let (SpecVersion::OpenApi3, Some(request_body)) = (version, &op.request_body) {
        let request_body = spec.resolve_request_body(request_body)?;
        if let Some((media_type, media)) = preferred_media(&request_body.content) {
            let ty = match &media.schema {
                Some(schema) => mapper.map_schema(schema)?,
                None => mapper_unknown(mapper)?,
            };
            body = Some(BodySpec {
                content: RequestContent {
                    kind: ContentKind::classify(media_type),
                    media_type: media_type.clone(),
                },
                parameter: body_parameter(ty, request_body.required),
            });
        }
    }

    let content_type = body.as_ref().map(|b| b.content.clone());
    if let Some(body) = body {
        parameters.push(body.parameter);
    }

    let mut responses = Vec::new();
    for (key, response) in &op.responses {
        let Some(status) = StatusKey::parse(key) else {
            tracing::debug!(status = %key, path, "skipping response with invalid status key");
            continue;
        };
        let response = spec.resolve_response(response)?;
        responses.push(convert_response(spec, version, op, mapper, status, response)?);
    }

    Ok(IrOperation {
        // assigned by the name resolver
        id: String::new(),
        operation_id: op.operation_id.clone(),
        method,
        path: path.to_string(),
        summary: op.summary.clone().or_else(|| op.description.clone()),
        parameters,
        content_type,
        responses,
    })
}

/// Path-level parameters first, operation-level ones replacing them by name and location
fn merge_parameters<'a>(
    spec: &'a OpenApiSpec,
    path_level: &'a [Parameter],
    operation_level: &'a [Parameter],
) -> Result<Vec<&'a Parameter>> {
    let mut merged: Vec<&Parameter> = Vec::new();
    for param in path_level.iter().chain(operation_level) {
        let param = spec.resolve_parameter(param)?;
        match merged
            .iter_mut()
            .find(|p| p.name == param.name && p.location == param.location)
        {
            Some(existing) => *existing = param,
            None => merged.push(param),
        }
    }
    Ok(merged)
}

/// Names inside `{}` in a path template, in order
fn template_params(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = &after[..end];
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = &after[end + 1..];
    }
    names
}

fn mapper_string(mapper: &mut TypeMapper<'_>) -> Result<clientgen_common::TypeId> {
    let schema = Schema {
        schema_type: Some(SchemaType::Single("string".into())),
        ..Schema::default()
    };
    Ok(mapper.map_schema(&schema)?)
}

fn mapper_unknown(mapper: &mut TypeMapper<'_>) -> Result<clientgen_common::TypeId> {
    Ok(mapper.map_schema(&Schema::default())?)
}

fn body_parameter(ty: clientgen_common::TypeId, required: bool) -> IrParameter {
    IrParameter {
        name: "body".to_string(),
        location: ParamLocation::Body,
        required,
        ty,
        description: None,
    }
}

/// JSON first, then multipart, then whatever is declared first
fn preferred_media<T>(content: &BTreeMap<String, T>) -> Option<(&String, &T)> {
    content
        .iter()
        .find(|(media_type, _)| ContentKind::classify(media_type) == ContentKind::Json)
        .or_else(|| {
            content
                .iter()
                .find(|(media_type, _)| ContentKind::classify(media_type) == ContentKind::Multipart)
        })
        .or_else(|| content.iter().next())
}

fn consumed_media_type(spec: &OpenApiSpec, op: &Operation) -> String {
    let consumes = if op.consumes.is_empty() {
        &spec.consumes
    } else {
        &op.consumes
    };
    consumes
        .iter()
        .find(|m| ContentKind::classify(m) == ContentKind::Json)
        .cloned()
        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string())
}

/// Swagger 2.0 `formData` parameters as one object body
fn form_body(
    spec: &OpenApiSpec,
    op: &Operation,
    mapper: &mut TypeMapper<'_>,
    fields: &[&Parameter],
) -> Result<BodySpec> {
    let consumes = if op.consumes.is_empty() {
        &spec.consumes
    } else {
        &op.consumes
    };
    let has_file = fields
        .iter()
        .any(|f| f.param_type.as_deref() == Some("file"));
    let multipart = has_file || consumes.iter().any(|m| m.eq_ignore_ascii_case(MULTIPART));

    let schema = Schema {
        schema_type: Some(SchemaType::Single("object".into())),
        properties: fields
            .iter()
            .map(|f| (f.name.clone(), f.value_schema()))
            .collect(),
        required: fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.clone())
            .collect(),
        ..Schema::default()
    };
    let ty = mapper.map_schema(&schema)?;

    let media_type = if multipart { MULTIPART } else { FORM_URLENCODED };
    Ok(BodySpec {
        content: RequestContent {
            kind: ContentKind::classify(media_type),
            media_type: media_type.to_string(),
        },
        parameter: body_parameter(ty, fields.iter().any(|f| f.required)),
    })
}

fn convert_response(
    spec: &OpenApiSpec,
    version: SpecVersion,
    op: &Operation,
    mapper: &mut TypeMapper<'_>,
    status: StatusKey,
    response: &Response,
) -> Result<ResponseSpec> {
    let mut content = Vec::new();
    match version {
        SpecVersion::OpenApi3 => {
            for (media_type, media) in &response.content {
                let ty = match &media.schema {
                    Some(schema) => Some(mapper.map_schema(schema)?),
                    None => None,
                };
                content.push(MediaSpec {
                    media_type: media_type.clone(),
                    ty,
                });
            }
        }
        SpecVersion::Swagger2 => {
            if let Some(schema) = &response.schema {
                let ty = mapper.map_schema(schema)?;
                let produces = if op.produces.is_empty() {
                    &spec.produces
                } else {
                    &op.produces
                };
                if produces.is_empty() {
                    content.push(MediaSpec {
                        media_type: DEFAULT_MEDIA_TYPE.to_string(),
                        ty: Some(ty),
                    });
                }
                for media_type in produces {
                    content.push(MediaSpec {
                        media_type: media_type.clone(),
                        ty: Some(ty),
                    });
                }
            }
        }
    }

    Ok(ResponseSpec {
        status,
        description: response.description.clone(),
        content,
    })
}

//! Emitters for `generated/clients/`: one file per client plus `mod.rs`.
//!
//! Method bodies carry most of the logic (URL building, paging loops), so
//! they are written here line by line and handed to the client template
//! already rendered.

use super::error::{GenerateError, Result};
use super::imports::{EmitScope, Use};
use super::model::{
    Client, FieldRef, Method, MethodKind, Module, ModulePath, PagingStrategy,
    ParamRef, SortedCrate, TokenResponse, Type, TypeGraph,
};
use super::templates::{
    doc_block, doc_lines, render, string_literal, ClientFieldView, ClientTemplateData, FileText,
    MethodOptionsView, ModRsTemplateData, OptionFieldView,
};
use crate::ids::{ClientId, RecordId};
use crate::spec::{ParameterLocation, TokenLocation};

/// Render `module`'s `generated/clients/` directory, `mod.rs` first.
/// Empty when the module declares no clients.
pub fn emit_client_files(
    krate: &SortedCrate,
    module: &Module,
    header: Option<&str>,
) -> Result<Vec<FileText>> {
    if module.clients.is_empty() {
        return Ok(Vec::new());
    }
    let mut files = vec![FileText {
        name: "mod.rs".to_string(),
        content: String::new(),
    }];
    let mut declarations = Vec::new();
    let mut reexports = Vec::new();
    for id in &module.clients {
        let client = krate.graph.client(*id);
        declarations.push(format!("mod {};", client.file_name));
        reexports.push(format!("pub use {}::*;", client.file_name));
        files.push(FileText {
            name: format!("{}.rs", client.file_name),
            content: emit_client(&krate.graph, *id, header)?,
        });
    }
    files[0].content = render(
        &ModRsTemplateData {
            declarations,
            reexports,
        },
        "generated/clients/mod.rs",
        header,
    )?;
    Ok(files)
}

fn emit_client(graph: &TypeGraph, id: ClientId, header: Option<&str>) -> Result<String> {
    let client = graph.client(id);
    let file = format!("generated/clients/{}.rs", client.file_name);
    let mut uses = Use::new(graph, &client.module, EmitScope::Clients);
    uses.local(&client.name);
    if let Some(ctor) = &client.constructor {
        uses.local(&ctor.options_name);
    }
    for m in client.methods.iter().filter(|m| !m.is_accessor()) {
        uses.local(&m.options_name);
    }
    uses.add("url", "Url");
    if client.constructor.is_some() || client.methods.iter().any(|m| !m.is_accessor()) {
        uses.add(&ModulePath::root().generated_path("error"), "Result");
    }

    let mut fields = Vec::with_capacity(client.fields.len());
    let mut ctor_params = String::new();
    let mut option_fields = Vec::new();
    for f in &client.fields {
        let ty = uses.decl(&f.ty)?;
        if f.optional {
            option_fields.push(OptionFieldView {
                docs: doc_block(f.docs.as_deref(), "    "),
                name: f.name.clone(),
                ty: ty.clone(),
            });
            fields.push(ClientFieldView {
                name: f.name.clone(),
                ty: format!("Option<{}>", ty),
                init: format!("{}: options.{}", f.name, f.name),
            });
        } else {
            ctor_params.push_str(&format!(", {}: {}", f.name, ty));
            fields.push(ClientFieldView {
                name: f.name.clone(),
                ty,
                init: f.name.clone(),
            });
        }
    }
    let mut methods = Vec::with_capacity(client.methods.len());
    let mut method_options = Vec::new();
    for method in &client.methods {
        let emitter = MethodEmitter {
            graph,
            client_id: id,
            client,
            method,
            qualified: format!("{}::{}", client.name, method.name),
        };
        methods.push(emitter.emit(&mut uses)?);
        if !method.is_accessor() {
            let mut fields = Vec::with_capacity(method.options.len());
            for p in &method.options {
                fields.push(OptionFieldView {
                    docs: doc_block(p.docs.as_deref(), "    "),
                    name: p.name.clone(),
                    ty: uses.decl(p.ty.unwrap_option())?,
                });
            }
            method_options.push(MethodOptionsView {
                name: method.options_name.clone(),
                visibility: method.visibility.prefix(),
                method: method.name.clone(),
                fields,
            });
        }
    }

    let data = ClientTemplateData {
        uses: uses.text(),
        docs: doc_block(client.docs.as_deref(), ""),
        visibility: client.visibility.prefix(),
        name: client.name.clone(),
        fields,
        constructable: client.constructor.is_some(),
        options_name: client
            .constructor
            .as_ref()
            .map(|c| c.options_name.clone())
            .unwrap_or_default(),
        option_fields,
        ctor_params,
        methods,
        method_options,
    };
    render(&data, &file, header)
}

/// Indented line buffer for method bodies.
struct Code {
    out: String,
    indent: usize,
}

impl Code {
    fn new(indent: usize) -> Self {
        Self {
            out: String::new(),
            indent,
        }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        for line in text.as_ref().lines() {
            if !line.is_empty() {
                self.out.push_str(&"    ".repeat(self.indent));
                self.out.push_str(line);
            }
            self.out.push('\n');
        }
    }

    fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.indent += 1;
    }

    fn close(&mut self, text: impl AsRef<str>) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    fn finish(self) -> String {
        self.out.trim_end().to_string()
    }
}

/// Where a request value is read from inside a method body.
#[derive(Debug, Clone)]
enum Source {
    /// Always present; the place expression holds a `T`
    Required(String),
    /// The place expression holds an `Option<T>`
    Optional(String),
}

/// A value sent with a request: a stored client field or a method parameter.
#[derive(Debug, Clone)]
struct Arg<'a> {
    local: &'a str,
    wire: &'a str,
    location: ParameterLocation,
    /// Value type without the optional wrapper
    ty: &'a Type,
    source: Source,
}

/// Types whose `Display` output is the wire format.
fn is_displayable(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Scalar(_) | Type::String | Type::Enum(_) | Type::External(_)
    )
}

/// Expression turning the place `place` of type `ty` into a `String`.
fn display_expr(ty: &Type, place: &str) -> String {
    match ty {
        t if is_displayable(t) => format!("{}.to_string()", place),
        Type::Vec(inner) if is_displayable(inner) => format!(
            "{}.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(\",\")",
            place
        ),
        Type::Option(inner) if is_displayable(inner) => format!(
            "{}.as_ref().map(|v| v.to_string()).unwrap_or_default()",
            place
        ),
        _ => format!("serde_json::to_string(&{})?", place),
    }
}

/// Owned access to the page field at `path`, moving out of `root`.
/// Missing optional values default.
fn owned_path(root: &str, path: &[FieldRef]) -> String {
    let mut expr = root.to_string();
    let mut optional = false;
    for step in path {
        expr = match (optional, step.optional) {
            (false, _) => format!("{}.{}", expr, step.name),
            (true, false) => format!("{}.map(|v| v.{})", expr, step.name),
            (true, true) => format!("{}.and_then(|v| v.{})", expr, step.name),
        };
        optional |= step.optional;
    }
    if optional {
        format!("{}.unwrap_or_default()", expr)
    } else {
        expr
    }
}

/// `Option<String>` read from the page field at `path`, borrowing `root`.
fn borrowed_path(root: &str, path: &[FieldRef], is_string: bool) -> String {
    let mut expr = root.to_string();
    let mut optional = false;
    for step in path {
        expr = match (optional, step.optional) {
            (false, false) => format!("{}.{}", expr, step.name),
            (false, true) => format!("{}.{}.as_ref()", expr, step.name),
            (true, false) => format!("{}.map(|v| &v.{})", expr, step.name),
            (true, true) => format!("{}.and_then(|v| v.{}.as_ref())", expr, step.name),
        };
        optional |= step.optional;
    }
    match (optional, is_string) {
        (true, true) => format!("{}.cloned()", expr),
        (true, false) => format!("{}.map(|v| v.to_string())", expr),
        (false, true) => format!("Some({}.clone())", expr),
        (false, false) => format!("Some({}.to_string())", expr),
    }
}

/// Type of the last field on `path`, starting at record `page`.
fn path_type<'a>(graph: &'a TypeGraph, page: RecordId, path: &[FieldRef]) -> Option<&'a Type> {
    let mut record = page;
    let mut ty = None;
    for step in path {
        let field = graph
            .record(record)
            .fields
            .iter()
            .find(|f| f.name == step.name)?;
        let inner = field.ty.unwrap_option().unwrap_box();
        if let Type::Record(next) = inner {
            record = *next;
        }
        ty = Some(inner);
    }
    ty
}

/// Split a path template segment into literal text and placeholder names.
fn split_placeholders(segment: &str) -> Vec<(bool, &str)> {
    let mut parts = Vec::new();
    let mut rest = segment;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        if start > 0 {
            parts.push((false, &rest[..start]));
        }
        parts.push((true, &rest[start + 1..start + len]));
        rest = &rest[start + len + 1..];
    }
    if !rest.is_empty() {
        parts.push((false, rest));
    }
    parts
}

struct MethodEmitter<'a> {
    graph: &'a TypeGraph,
    client_id: ClientId,
    client: &'a Client,
    method: &'a Method,
    qualified: String,
}

impl<'a> MethodEmitter<'a> {
    fn emit(&self, uses: &mut Use<'_>) -> Result<String> {
        let mut code = Code::new(1);
        for line in doc_lines(self.method.docs.as_deref(), "") {
            code.line(line);
        }
        match &self.method.kind {
            MethodKind::ClientAccessor { client } => self.emit_accessor(&mut code, *client, uses)?,
            MethodKind::Basic { returns } => self.emit_basic(&mut code, returns.as_ref(), uses)?,
            MethodKind::Pageable {
                page,
                items,
                item,
                strategy,
            } => {
                let page_ty = uses.decl(&Type::Record(*page))?;
                let item_ty = uses.decl(item)?;
                self.open_signature(&mut code, &format!("Vec<{}>", item_ty), uses)?;
                match strategy {
                    PagingStrategy::NextLink {
                        next_link,
                        reinjected,
                    } => self.emit_next_link(&mut code, *page, &page_ty, items, next_link, reinjected)?,
                    PagingStrategy::ContinuationToken { request, response } => {
                        let excluded = request.param.name.as_str();
                        code.line(format!(
                            "let mut token: Option<String> = {};",
                            self.initial_token(&request.param)
                        ));
                        code.line("let mut items = Vec::new();");
                        code.open("loop {");
                        let token_in_query = request.location == TokenLocation::Query;
                        self.emit_url(&mut code, Some(excluded), token_in_query)?;
                        if token_in_query {
                            code.open("if let Some(token) = &token {");
                            code.line(format!(
                                "url.query_pairs_mut().append_pair({}, token);",
                                string_literal(&request.wire_name)
                            ));
                            code.close("}");
                        }
                        let token_in_header = request.location == TokenLocation::Header;
                        self.emit_request(&mut code, "url", Some(excluded), token_in_header);
                        if token_in_header {
                            code.open("if let Some(token) = &token {");
                            code.line(format!(
                                "request = request.header({}, token.as_str());",
                                string_literal(&request.wire_name)
                            ));
                            code.close("}");
                        }
                        code.line("let response = request.send().await?.error_for_status()?;");
                        if let TokenResponse::Header(name) = response {
                            code.line(format!(
                                "let next_token = response.headers().get({}).and_then(|v| v.to_str().ok()).map(str::to_string);",
                                string_literal(name)
                            ));
                        }
                        code.line(format!(
                            "let page: {} = serde_json::from_slice(&response.bytes().await?)?;",
                            page_ty
                        ));
                        if let TokenResponse::Body(path) = response {
                            let is_string =
                                matches!(path_type(self.graph, *page, path), Some(Type::String));
                            code.line(format!(
                                "let next_token = {};",
                                borrowed_path("page", path, is_string)
                            ));
                        }
                        code.line(format!("items.extend({});", owned_path("page", items)));
                        code.open("match next_token.filter(|t| !t.is_empty()) {");
                        code.line("Some(next) => token = Some(next),");
                        code.line("None => break,");
                        code.close("}");
                        code.close("}");
                        code.line("Ok(items)");
                    }
                }
                code.close("}");
            }
        }
        Ok(code.finish())
    }

    /// Every value the method can send, client fields first.
    fn args(&self) -> Vec<Arg<'a>> {
        let mut args = Vec::new();
        for f in &self.client.fields {
            let place = format!("self.{}", f.name);
            args.push(Arg {
                local: &f.name,
                wire: &f.wire_name,
                location: f.location,
                ty: &f.ty,
                source: if f.optional {
                    Source::Optional(place)
                } else {
                    Source::Required(place)
                },
            });
        }
        for p in &self.method.params {
            args.push(Arg {
                local: &p.name,
                wire: &p.wire_name,
                location: p.location,
                ty: &p.ty,
                source: Source::Required(p.name.clone()),
            });
        }
        for p in &self.method.options {
            args.push(Arg {
                local: &p.name,
                wire: &p.wire_name,
                location: p.location,
                ty: p.ty.unwrap_option(),
                source: Source::Optional(format!("options.{}", p.name)),
            });
        }
        args
    }

    fn open_signature(&self, code: &mut Code, returns: &str, uses: &mut Use<'_>) -> Result<()> {
        let mut params = String::new();
        for p in &self.method.params {
            params.push_str(&format!(", {}: {}", p.name, uses.decl(&p.ty)?));
        }
        for p in &self.method.options {
            uses.add_for_type(&p.ty)?;
        }
        code.open(format!(
            "{}async fn {}(&self{}, options: Option<{}>) -> Result<{}> {{",
            self.method.visibility.prefix(),
            self.method.name,
            params,
            self.method.options_name,
            returns
        ));
        if self.method.options.is_empty() {
            code.line("let _ = options;");
        } else {
            code.line("let options = options.unwrap_or_default();");
        }
        Ok(())
    }

    fn emit_basic(&self, code: &mut Code, returns: Option<&Type>, uses: &mut Use<'_>) -> Result<()> {
        let ret = match returns {
            Some(ty) => uses.decl(ty)?,
            None => "()".to_string(),
        };
        self.open_signature(code, &ret, uses)?;
        self.emit_url(code, None, false)?;
        self.emit_request(code, "url", None, false);
        if returns.is_some() {
            code.line("let response = request.send().await?.error_for_status()?;");
            code.line("Ok(serde_json::from_slice(&response.bytes().await?)?)");
        } else {
            code.line("request.send().await?.error_for_status()?;");
            code.line("Ok(())");
        }
        code.close("}");
        Ok(())
    }

    fn emit_next_link(
        &self,
        code: &mut Code,
        page: RecordId,
        page_ty: &str,
        items: &[FieldRef],
        next_link: &[FieldRef],
        reinjected: &[ParamRef],
    ) -> Result<()> {
        self.emit_url(code, None, true)?;
        code.line("let mut items = Vec::new();");
        code.open("loop {");
        self.emit_request(code, "url.clone()", None, false);
        code.line("let response = request.send().await?.error_for_status()?;");
        code.line(format!(
            "let page: {} = serde_json::from_slice(&response.bytes().await?)?;",
            page_ty
        ));
        let is_string = matches!(path_type(self.graph, page, next_link), Some(Type::String));
        code.line(format!(
            "let next_link = {};",
            borrowed_path("page", next_link, is_string)
        ));
        code.line(format!("items.extend({});", owned_path("page", items)));
        code.open("let Some(next_link) = next_link.filter(|link| !link.is_empty()) else {");
        code.line("break;");
        code.close("};");
        code.line("url = self.endpoint.join(&next_link)?;");
        let args = self.args();
        for r in reinjected {
            let Some(arg) = args.iter().find(|a| a.local == r.name) else {
                return Err(GenerateError::UnknownPagingParameter {
                    method: self.qualified.clone(),
                    parameter: r.wire_name.clone(),
                });
            };
            code.open(format!(
                "if !url.query_pairs().any(|(key, _)| key == {}) {{",
                string_literal(&r.wire_name)
            ));
            emit_query_pair(code, arg);
            code.close("}");
        }
        code.close("}");
        code.line("Ok(items)");
        Ok(())
    }

    fn initial_token(&self, param: &ParamRef) -> String {
        if param.in_options {
            format!(
                "options.{}.as_ref().map(|value| value.to_string())",
                param.name
            )
        } else {
            format!("Some({}.to_string())", param.name)
        }
    }

    /// `let url = ...` with the path and query parameters applied.
    fn emit_url(&self, code: &mut Code, excluded: Option<&str>, force_mut: bool) -> Result<()> {
        let args: Vec<Arg<'_>> = self
            .args()
            .into_iter()
            .filter(|a| Some(a.local) != excluded)
            .collect();
        let path = self.method.http.as_ref().map(|h| h.path.as_str()).unwrap_or("");
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let queries: Vec<&Arg<'_>> = args
            .iter()
            .filter(|a| a.location == ParameterLocation::Query)
            .collect();

        let mutable = force_mut || !segments.is_empty() || !queries.is_empty();
        code.line(format!(
            "let {}url = self.endpoint.clone();",
            if mutable { "mut " } else { "" }
        ));
        if !segments.is_empty() {
            code.line("url.path_segments_mut()");
            code.indent += 1;
            code.line(
                ".map_err(|_| crate::generated::error::Error::InvalidEndpoint(self.endpoint.to_string()))?",
            );
            code.line(".pop_if_empty()");
            let last = segments.len() - 1;
            for (i, segment) in segments.iter().enumerate() {
                let end = if i == last { ";" } else { "" };
                code.line(format!(".push({}){}", self.segment_expr(segment, &args)?, end));
            }
            code.indent -= 1;
        }
        for arg in queries {
            emit_query_pair(code, arg);
        }
        Ok(())
    }

    fn segment_expr(&self, segment: &str, args: &[Arg<'_>]) -> Result<String> {
        let parts = split_placeholders(segment);
        if !parts.iter().any(|(placeholder, _)| *placeholder) {
            return Ok(string_literal(segment));
        }
        let mut format = String::new();
        let mut values = Vec::new();
        for (placeholder, text) in parts {
            if !placeholder {
                format.push_str(&text.replace('{', "{{").replace('}', "}}"));
                continue;
            }
            let arg = args.iter().find(|a| a.wire == text).ok_or_else(|| {
                GenerateError::UnknownPathParameter {
                    method: self.qualified.clone(),
                    parameter: text.to_string(),
                }
            })?;
            format.push_str("{}");
            values.push(match &arg.source {
                Source::Required(place) => display_expr(arg.ty, place),
                Source::Optional(place) => format!(
                    "{}.as_ref().map(|v| v.to_string()).unwrap_or_default()",
                    place
                ),
            });
        }
        if format == "{}" {
            Ok(format!("&{}", values.join("")))
        } else {
            Ok(format!(
                "&format!({}, {})",
                string_literal(&format),
                values.join(", ")
            ))
        }
    }

    /// `let request = ...` with headers and body applied.
    fn emit_request(&self, code: &mut Code, url: &str, excluded: Option<&str>, force_mut: bool) {
        let args: Vec<Arg<'_>> = self
            .args()
            .into_iter()
            .filter(|a| Some(a.local) != excluded)
            .filter(|a| matches!(a.location, ParameterLocation::Header | ParameterLocation::Body))
            .collect();
        let verb = self
            .method
            .http
            .as_ref()
            .map(|h| h.method.as_str())
            .unwrap_or("GET");
        code.line(format!(
            "let {}request = self.http.request(reqwest::Method::{}, {});",
            if force_mut || !args.is_empty() { "mut " } else { "" },
            verb,
            url
        ));
        for arg in &args {
            let wire = string_literal(arg.wire);
            match (&arg.source, arg.location) {
                (Source::Required(place), ParameterLocation::Body) => {
                    code.line(format!("request = request.json(&{});", place));
                }
                (Source::Optional(place), ParameterLocation::Body) => {
                    code.open(format!("if let Some(value) = &{} {{", place));
                    code.line("request = request.json(value);");
                    code.close("}");
                }
                (Source::Required(place), _) => {
                    code.line(format!(
                        "request = request.header({}, {});",
                        wire,
                        display_expr(arg.ty, place)
                    ));
                }
                (Source::Optional(place), _) => {
                    code.open(format!("if let Some(value) = &{} {{", place));
                    code.line(format!(
                        "request = request.header({}, {});",
                        wire,
                        display_expr(arg.ty, "value")
                    ));
                    code.close("}");
                }
            }
        }
    }

    fn emit_accessor(&self, code: &mut Code, target: ClientId, uses: &mut Use<'_>) -> Result<()> {
        let sub = self.graph.client(target);
        let sub_ty = if target == self.client_id {
            sub.name.clone()
        } else {
            uses.decl(&Type::Client(target))?
        };
        let mut params = String::new();
        let mut inits = vec![
            "endpoint: self.endpoint.clone(),".to_string(),
            "http: self.http.clone(),".to_string(),
        ];
        for f in &sub.fields {
            let inherited = self
                .client
                .fields
                .iter()
                .any(|p| p.name == f.name && p.optional == f.optional && p.ty == f.ty);
            if inherited {
                inits.push(format!("{}: self.{}.clone(),", f.name, f.name));
                continue;
            }
            let ty = uses.decl(&f.ty)?;
            if f.optional {
                params.push_str(&format!(", {}: Option<{}>", f.name, ty));
            } else {
                params.push_str(&format!(", {}: {}", f.name, ty));
            }
            inits.push(format!("{},", f.name));
        }
        code.open(format!(
            "{}fn {}(&self{}) -> {} {{",
            self.method.visibility.prefix(),
            self.method.name,
            params,
            sub_ty
        ));
        code.open(format!("{} {{", sub_ty));
        for init in inits {
            code.line(init);
        }
        code.close("}");
        code.close("}");
        Ok(())
    }
}

fn emit_query_pair(code: &mut Code, arg: &Arg<'_>) {
    let wire = string_literal(arg.wire);
    match &arg.source {
        Source::Required(place) => code.line(format!(
            "url.query_pairs_mut().append_pair({}, &{});",
            wire,
            display_expr(arg.ty, place)
        )),
        Source::Optional(place) => {
            code.open(format!("if let Some(value) = &{} {{", place));
            code.line(format!(
                "url.query_pairs_mut().append_pair({}, &{});",
                wire,
                display_expr(arg.ty, "value")
            ));
            code.close("}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, optional: bool) -> FieldRef {
        FieldRef {
            name: name.to_string(),
            optional,
        }
    }

    #[test]
    fn test_owned_path() {
        assert_eq!(owned_path("page", &[field("value", false)]), "page.value");
        assert_eq!(
            owned_path("page", &[field("value", true)]),
            "page.value.unwrap_or_default()"
        );
        assert_eq!(
            owned_path("page", &[field("result", true), field("items", false)]),
            "page.result.map(|v| v.items).unwrap_or_default()"
        );
        assert_eq!(
            owned_path("page", &[field("result", true), field("items", true)]),
            "page.result.and_then(|v| v.items).unwrap_or_default()"
        );
    }

    #[test]
    fn test_borrowed_path() {
        assert_eq!(
            borrowed_path("page", &[field("nextLink", true)], true),
            "page.nextLink.as_ref().cloned()"
        );
        assert_eq!(
            borrowed_path("page", &[field("next", false)], true),
            "Some(page.next.clone())"
        );
        assert_eq!(
            borrowed_path("page", &[field("meta", true), field("next", false)], false),
            "page.meta.as_ref().map(|v| &v.next).map(|v| v.to_string())"
        );
    }

    #[test]
    fn test_split_placeholders() {
        assert_eq!(
            split_placeholders("{name}.json"),
            vec![(true, "name"), (false, ".json")]
        );
        assert_eq!(split_placeholders("widgets"), vec![(false, "widgets")]);
    }

    #[test]
    fn test_display_expr() {
        assert_eq!(display_expr(&Type::String, "self.api_version"), "self.api_version.to_string()");
        assert_eq!(
            display_expr(&Type::Vec(Box::new(Type::String)), "value"),
            "value.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(\",\")"
        );
        assert_eq!(
            display_expr(&Type::HashMap(Box::new(Type::String), Box::new(Type::String)), "tags"),
            "serde_json::to_string(&tags)?"
        );
    }
}

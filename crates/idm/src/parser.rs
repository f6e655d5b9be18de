//! IDL Parser
//!
//! Single pass recursive descent over the token stream, building the
//! canonical AST directly. The first malformed construct aborts the parse.

use tracing::debug;

use crate::ast::*;
use crate::builder::FieldBuilder;
use crate::error::{line_col, IdlError, Result};
use crate::lexer::{Keyword, Lexer, SpannedToken, Token};
use crate::resolve;

/// Parse IDL text into a resolved [`Idl`]
pub fn parse(input: &str, file_name: &str) -> Result<Idl> {
    let idl = parse_unresolved(input, file_name)?;
    resolve::resolve(&idl)?;
    debug!(
        file = file_name,
        clusters = idl.clusters.len(),
        endpoints = idl.endpoints.len(),
        "parsed IDL"
    );
    Ok(idl)
}

/// Parse IDL text without running the type-resolution pass
pub fn parse_unresolved(input: &str, file_name: &str) -> Result<Idl> {
    let mut lexer = Lexer::new(input, file_name);
    let tokens = lexer.tokenize()?;
    let mut parser = Parser::new(&tokens, input, file_name);
    let mut idl = parser.parse_idl()?;
    idl.parse_file_name = Some(file_name.to_string());
    Ok(idl)
}

/// Token cursor shared by the IDL parser and the lint rule file parser
pub(crate) struct Parser<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
    input: &'a str,
    file_name: &'a str,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(tokens: &'a [SpannedToken], input: &'a str, file_name: &'a str) -> Self {
        Self {
            tokens,
            pos: 0,
            input,
            file_name,
        }
    }

    pub(crate) fn current(&self) -> &Token {
        self.tokens.get(self.pos).map(|t| &t.token).unwrap_or(&Token::Eof)
    }

    fn peek(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn current_pos(&self) -> usize {
        self.tokens.get(self.pos).map(|t| t.span.start).unwrap_or(self.input.len())
    }

    fn current_doc(&self) -> Option<String> {
        self.tokens.get(self.pos).and_then(|t| t.doc.clone())
    }

    pub(crate) fn meta(&self) -> ParseMeta {
        let start_pos = self.current_pos();
        let (line, column) = line_col(self.input, start_pos);
        ParseMeta {
            line,
            column,
            start_pos,
        }
    }

    pub(crate) fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> IdlError {
        IdlError::parse(self.file_name, self.input, self.current_pos(), message)
    }

    pub(crate) fn unexpected(&self, expected: &str) -> IdlError {
        self.error(format!("expected {}, found {}", expected, self.current()))
    }

    pub(crate) fn at_eof(&self) -> bool {
        *self.current() == Token::Eof
    }

    pub(crate) fn at(&self, token: &Token) -> bool {
        self.current() == token
    }

    pub(crate) fn eat(&mut self, token: &Token) -> bool {
        if self.at(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, expected: &Token) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    pub(crate) fn keyword(&self) -> Option<Keyword> {
        match self.current() {
            Token::Ident(s) => Keyword::from_ident(s),
            _ => None,
        }
    }

    fn keyword_at(&self, offset: usize) -> Option<Keyword> {
        match self.peek(offset) {
            Token::Ident(s) => Keyword::from_ident(s),
            _ => None,
        }
    }

    pub(crate) fn at_keyword(&self, keyword: Keyword) -> bool {
        self.keyword() == Some(keyword)
    }

    pub(crate) fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{}`", keyword.as_str())))
        }
    }

    /// Match an identifier that is not part of the IDL keyword set
    pub(crate) fn eat_word(&mut self, word: &str) -> bool {
        if matches!(self.current(), Token::Ident(s) if s == word) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_word(&mut self, word: &str) -> Result<()> {
        if self.eat_word(word) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{}`", word)))
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Result<String> {
        match self.current() {
            Token::Ident(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    pub(crate) fn expect_integer(&mut self) -> Result<i64> {
        let negative = self.eat(&Token::Minus);

        match self.current() {
            Token::Integer(n) | Token::HexInteger(n) => {
                let n = *n;
                self.advance();
                Ok(if negative { -n } else { n })
            }
            _ => Err(self.unexpected("integer")),
        }
    }

    pub(crate) fn expect_u32(&mut self) -> Result<u32> {
        let value = self.expect_integer()?;
        u32::try_from(value).map_err(|_| self.error(format!("value {} out of range", value)))
    }

    fn expect_u64(&mut self) -> Result<u64> {
        let value = self.expect_integer()?;
        u64::try_from(value).map_err(|_| self.error(format!("value {} out of range", value)))
    }

    pub(crate) fn expect_string(&mut self) -> Result<String> {
        match self.current() {
            Token::StringLiteral(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.unexpected("string")),
        }
    }

    fn parse_idl(&mut self) -> Result<Idl> {
        let mut idl = Idl::new();

        while !self.at_eof() {
            let doc = self.current_doc();
            let maturity = self.parse_maturity();

            match self.keyword() {
                Some(Keyword::Enum) => idl.global_enums.push(self.parse_enum(maturity)?),
                Some(Keyword::Bitmap) => idl.global_bitmaps.push(self.parse_bitmap(maturity)?),
                Some(Keyword::FabricScoped | Keyword::Request | Keyword::Response | Keyword::Struct) => {
                    idl.global_structs.push(self.parse_struct(maturity)?)
                }
                Some(Keyword::Client | Keyword::Server | Keyword::Cluster) => {
                    idl.clusters.push(self.parse_cluster(maturity, doc)?)
                }
                Some(Keyword::Endpoint) => idl.endpoints.push(self.parse_endpoint()?),
                _ => {
                    return Err(self.unexpected(
                        "`cluster`, `endpoint`, `struct`, `enum` or `bitmap`",
                    ))
                }
            }
        }

        Ok(idl)
    }

    fn parse_maturity(&mut self) -> ApiMaturity {
        let maturity = match self.keyword() {
            Some(Keyword::Provisional) => ApiMaturity::Provisional,
            Some(Keyword::Internal) => ApiMaturity::Internal,
            Some(Keyword::Deprecated) => ApiMaturity::Deprecated,
            Some(Keyword::Stable) => ApiMaturity::Stable,
            _ => return ApiMaturity::Stable,
        };
        self.advance();
        maturity
    }

    fn parse_constant_entries(&mut self) -> Result<Vec<ConstantEntry>> {
        self.expect(&Token::LBrace)?;
        let mut entries = Vec::new();

        while !self.eat(&Token::RBrace) {
            let name = self.expect_ident()?;
            self.expect(&Token::Equals)?;
            let code = self.expect_u64()?;
            self.expect(&Token::Semicolon)?;
            entries.push(ConstantEntry { name, code });
        }

        Ok(entries)
    }

    fn parse_enum(&mut self, api_maturity: ApiMaturity) -> Result<Enum> {
        self.expect_keyword(Keyword::Enum)?;
        let name = self.expect_ident()?;
        self.expect(&Token::Colon)?;
        let base_type = crate::builder::normalize_type_name(&self.expect_ident()?);
        let entries = self.parse_constant_entries()?;

        Ok(Enum {
            name,
            base_type,
            entries,
            api_maturity,
        })
    }

    fn parse_bitmap(&mut self, api_maturity: ApiMaturity) -> Result<Bitmap> {
        self.expect_keyword(Keyword::Bitmap)?;
        let name = self.expect_ident()?;
        self.expect(&Token::Colon)?;
        let base_type = crate::builder::normalize_type_name(&self.expect_ident()?);
        let entries = self.parse_constant_entries()?;

        Ok(Bitmap {
            name,
            base_type,
            entries,
            api_maturity,
        })
    }

    fn parse_struct(&mut self, api_maturity: ApiMaturity) -> Result<Struct> {
        let fabric_scoped = self.eat_keyword(Keyword::FabricScoped);
        let tag = if self.eat_keyword(Keyword::Request) {
            Some(StructTag::Request)
        } else if self.eat_keyword(Keyword::Response) {
            Some(StructTag::Response)
        } else {
            None
        };

        self.expect_keyword(Keyword::Struct)?;
        let name = self.expect_ident()?;

        let code = if self.eat(&Token::Equals) {
            Some(self.expect_u32()?)
        } else {
            None
        };
        if tag == Some(StructTag::Response) && code.is_none() {
            return Err(self.error(format!("response struct {} requires a command id", name)));
        }

        let fields = self.parse_field_block()?;

        Ok(Struct {
            name,
            fields,
            tag,
            code,
            fabric_scoped,
            api_maturity,
        })
    }

    fn parse_field_block(&mut self) -> Result<Vec<Field>> {
        self.expect(&Token::LBrace)?;
        let mut fields = Vec::new();
        while !self.eat(&Token::RBrace) {
            fields.push(self.parse_field()?);
        }
        Ok(fields)
    }

    /// `[maturity] (optional|nullable|fabric_sensitive)* type[<len>] name[[]] = code;`
    fn parse_field(&mut self) -> Result<Field> {
        let maturity = self.parse_maturity();

        let mut qualities = FieldQualities::none();
        // A quality keyword is only a quality when another identifier follows
        while matches!(self.peek(1), Token::Ident(_)) {
            match self.keyword() {
                Some(Keyword::Optional) => qualities.optional = true,
                Some(Keyword::Nullable) => qualities.nullable = true,
                Some(Keyword::FabricSensitive) => qualities.fabric_sensitive = true,
                _ => break,
            }
            self.advance();
        }

        let type_name = self.expect_ident()?;
        let max_length = if self.eat(&Token::LAngle) {
            let len = self.expect_u32()?;
            self.expect(&Token::RAngle)?;
            Some(len)
        } else {
            None
        };

        let name = self.expect_ident()?;
        let is_list = if self.eat(&Token::LBracket) {
            self.expect(&Token::RBracket)?;
            true
        } else {
            false
        };

        self.expect(&Token::Equals)?;
        let code = self.expect_u32()?;
        self.expect(&Token::Semicolon)?;

        Ok(FieldBuilder::new(name, code, &type_name)
            .max_length(max_length)
            .list(is_list)
            .qualities(qualities)
            .api_maturity(maturity)
            .build())
    }

    fn parse_cluster(&mut self, api_maturity: ApiMaturity, doc: Option<String>) -> Result<Cluster> {
        let meta = self.meta();
        let side = if self.eat_keyword(Keyword::Client) {
            ClusterSide::Client
        } else {
            self.eat_keyword(Keyword::Server);
            ClusterSide::Server
        };
        // The doc comment may sit on the side keyword or on `cluster`
        let doc = doc.or_else(|| self.current_doc());
        self.expect_keyword(Keyword::Cluster)?;

        let name = self.expect_ident()?;
        self.expect(&Token::Equals)?;
        let code = self.expect_u32()?;

        let mut cluster = Cluster::new(side, name, code);
        cluster.api_maturity = api_maturity;
        cluster.description = doc;
        cluster.parse_meta = Some(meta);

        self.expect(&Token::LBrace)?;
        while !self.eat(&Token::RBrace) {
            self.parse_cluster_member(&mut cluster)?;
        }

        Ok(cluster)
    }

    fn parse_cluster_member(&mut self, cluster: &mut Cluster) -> Result<()> {
        if self.eat_keyword(Keyword::Revision) {
            cluster.revision = self.expect_u32()?;
            self.expect(&Token::Semicolon)?;
            return Ok(());
        }

        let maturity = self.parse_maturity();
        match self.keyword() {
            Some(Keyword::Enum) => cluster.enums.push(self.parse_enum(maturity)?),
            Some(Keyword::Bitmap) => cluster.bitmaps.push(self.parse_bitmap(maturity)?),
            Some(Keyword::FabricScoped | Keyword::Request | Keyword::Response | Keyword::Struct) => {
                cluster.structs.push(self.parse_struct(maturity)?)
            }
            Some(Keyword::FabricSensitive | Keyword::Critical | Keyword::Info | Keyword::Debug) => {
                cluster.events.push(self.parse_event(maturity)?)
            }
            Some(Keyword::Readonly | Keyword::Nosubscribe | Keyword::Attribute) => {
                cluster.attributes.push(self.parse_attribute(maturity)?)
            }
            Some(Keyword::Timed) if self.keyword_at(1) == Some(Keyword::Write) => {
                cluster.attributes.push(self.parse_attribute(maturity)?)
            }
            Some(Keyword::Timed | Keyword::Fabric | Keyword::Command) => {
                cluster.commands.push(self.parse_command(maturity)?)
            }
            _ => {
                return Err(self.unexpected(
                    "`revision`, `enum`, `bitmap`, `struct`, `event`, `attribute` or `command`",
                ))
            }
        }
        Ok(())
    }

    /// `access(read: view, write: manage)`; `None` entries keep their default
    fn parse_access(&mut self) -> Result<Vec<(Keyword, AccessPrivilege)>> {
        let mut entries = Vec::new();
        if !self.eat_keyword(Keyword::Access) {
            return Ok(entries);
        }

        self.expect(&Token::LParen)?;
        loop {
            let op = match self.keyword() {
                Some(op @ (Keyword::Read | Keyword::Write | Keyword::Invoke)) => op,
                _ => return Err(self.unexpected("`read`, `write` or `invoke`")),
            };
            self.advance();
            self.expect(&Token::Colon)?;
            let privilege = match self.current() {
                Token::Ident(s) => AccessPrivilege::from_keyword(s),
                _ => None,
            }
            .ok_or_else(|| self.unexpected("`view`, `operate`, `manage` or `administer`"))?;
            self.advance();
            entries.push((op, privilege));

            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;
        Ok(entries)
    }

    fn parse_event(&mut self, api_maturity: ApiMaturity) -> Result<Event> {
        let fabric_sensitive = self.eat_keyword(Keyword::FabricSensitive);
        let priority = match self.keyword() {
            Some(Keyword::Critical) => EventPriority::Critical,
            Some(Keyword::Info) => EventPriority::Info,
            Some(Keyword::Debug) => EventPriority::Debug,
            _ => return Err(self.unexpected("event priority")),
        };
        self.advance();
        self.expect_keyword(Keyword::Event)?;

        let mut read_acl = AccessPrivilege::View;
        for (op, privilege) in self.parse_access()? {
            match op {
                Keyword::Read => read_acl = privilege,
                _ => return Err(self.error("events only support `read` access")),
            }
        }

        let name = self.expect_ident()?;
        self.expect(&Token::Equals)?;
        let code = self.expect_u32()?;
        let fields = self.parse_field_block()?;

        Ok(Event {
            priority,
            name,
            code,
            fields,
            read_acl,
            fabric_sensitive,
            api_maturity,
        })
    }

    fn parse_attribute(&mut self, api_maturity: ApiMaturity) -> Result<Attribute> {
        let meta = self.meta();
        let mut qualities = AttributeQualities::default();

        loop {
            match self.keyword() {
                Some(Keyword::Readonly) => qualities.writable = false,
                Some(Keyword::Nosubscribe) => qualities.nosubscribe = true,
                Some(Keyword::Timed) => {
                    self.advance();
                    self.expect_keyword(Keyword::Write)?;
                    qualities.timed_write = true;
                    continue;
                }
                _ => break,
            }
            self.advance();
        }
        self.expect_keyword(Keyword::Attribute)?;

        let mut read_acl = AccessPrivilege::View;
        let mut write_acl = AccessPrivilege::Operate;
        for (op, privilege) in self.parse_access()? {
            match op {
                Keyword::Read => read_acl = privilege,
                Keyword::Write => write_acl = privilege,
                _ => return Err(self.error("attributes only support `read` and `write` access")),
            }
        }

        let definition = self.parse_field()?;

        Ok(Attribute {
            definition,
            qualities,
            read_acl,
            write_acl,
            api_maturity,
            parse_meta: Some(meta),
        })
    }

    fn parse_command(&mut self, api_maturity: ApiMaturity) -> Result<Command> {
        let mut qualities = CommandQualities::default();
        loop {
            match self.keyword() {
                Some(Keyword::Timed) => qualities.timed_invoke = true,
                Some(Keyword::Fabric) => qualities.fabric_scoped = true,
                _ => break,
            }
            self.advance();
        }
        self.expect_keyword(Keyword::Command)?;

        let mut invoke_acl = AccessPrivilege::Operate;
        for (op, privilege) in self.parse_access()? {
            match op {
                Keyword::Invoke => invoke_acl = privilege,
                _ => return Err(self.error("commands only support `invoke` access")),
            }
        }

        let name = self.expect_ident()?;
        self.expect(&Token::LParen)?;
        let input_param = match self.current() {
            Token::Ident(_) => Some(self.expect_ident()?),
            _ => None,
        };
        self.expect(&Token::RParen)?;
        self.expect(&Token::Colon)?;
        let output_param = self.expect_ident()?;
        self.expect(&Token::Equals)?;
        let code = self.expect_u32()?;
        self.expect(&Token::Semicolon)?;

        Ok(Command {
            name,
            code,
            input_param,
            output_param,
            qualities,
            invoke_acl,
            api_maturity,
        })
    }

    fn parse_endpoint(&mut self) -> Result<Endpoint> {
        let meta = self.meta();
        self.expect_keyword(Keyword::Endpoint)?;
        let number = self.expect_integer()?;
        let number = u16::try_from(number)
            .map_err(|_| self.error(format!("endpoint number {} out of range", number)))?;

        let mut endpoint = Endpoint::new(number);
        endpoint.parse_meta = Some(meta);

        self.expect(&Token::LBrace)?;
        while !self.eat(&Token::RBrace) {
            match self.keyword() {
                Some(Keyword::Device) => {
                    self.advance();
                    self.expect_keyword(Keyword::Type)?;
                    let name = self.expect_ident()?;
                    self.expect(&Token::Equals)?;
                    let code = self.expect_u32()?;
                    self.expect(&Token::Comma)?;
                    self.expect_keyword(Keyword::Version)?;
                    let version = self.expect_u32()?;
                    self.expect(&Token::Semicolon)?;
                    endpoint.device_types.push(DeviceType { name, code, version });
                }
                Some(Keyword::Binding) => {
                    self.advance();
                    self.expect_keyword(Keyword::Cluster)?;
                    endpoint.client_bindings.push(self.expect_ident()?);
                    self.expect(&Token::Semicolon)?;
                }
                Some(Keyword::Server) => {
                    endpoint.server_clusters.push(self.parse_server_cluster()?);
                }
                _ => return Err(self.unexpected("`device`, `binding` or `server`")),
            }
        }

        Ok(endpoint)
    }

    fn parse_server_cluster(&mut self) -> Result<ServerClusterInstantiation> {
        let meta = self.meta();
        self.expect_keyword(Keyword::Server)?;
        self.expect_keyword(Keyword::Cluster)?;

        let mut instance = ServerClusterInstantiation::new(self.expect_ident()?);
        instance.parse_meta = Some(meta);

        self.expect(&Token::LBrace)?;
        while !self.eat(&Token::RBrace) {
            match self.keyword() {
                Some(Keyword::Ram | Keyword::Persist | Keyword::Callback) => {
                    let storage = match self.keyword() {
                        Some(Keyword::Ram) => AttributeStorage::Ram,
                        Some(Keyword::Persist) => AttributeStorage::Persist,
                        _ => AttributeStorage::Callback,
                    };
                    self.advance();
                    self.expect_keyword(Keyword::Attribute)?;
                    let name = self.expect_ident()?;
                    let default = if self.eat_keyword(Keyword::Default) {
                        self.expect(&Token::Equals)?;
                        Some(self.parse_default_value()?)
                    } else {
                        None
                    };
                    self.expect(&Token::Semicolon)?;
                    instance.attributes.push(AttributeInstantiation { name, storage, default });
                }
                Some(Keyword::Emits) => {
                    self.advance();
                    self.expect_keyword(Keyword::Event)?;
                    instance.events_emitted.push(self.expect_ident()?);
                    self.expect(&Token::Semicolon)?;
                }
                Some(Keyword::Handle) => {
                    self.advance();
                    self.expect_keyword(Keyword::Command)?;
                    instance.commands.push(self.expect_ident()?);
                    self.expect(&Token::Semicolon)?;
                }
                _ => return Err(self.unexpected("`ram`, `persist`, `callback`, `emits` or `handle`")),
            }
        }

        Ok(instance)
    }

    fn parse_default_value(&mut self) -> Result<DefaultValue> {
        let negative = self.eat(&Token::Minus);
        let value = match self.current() {
            Token::Integer(n) | Token::HexInteger(n) => DefaultValue::Integer(if negative { -*n } else { *n }),
            Token::Float(v) => DefaultValue::Float(if negative { -*v } else { *v }),
            Token::StringLiteral(s) if !negative => DefaultValue::String(s.clone()),
            Token::Ident(s) if !negative && s == "true" => DefaultValue::Boolean(true),
            Token::Ident(s) if !negative && s == "false" => DefaultValue::Boolean(false),
            _ => return Err(self.unexpected("default value")),
        };
        self.advance();
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTIFY: &str = r#"
        /** Attributes and commands for putting a device into Identification mode. */
        server cluster Identify = 0x0003 {
            revision 4;

            enum EffectIdentifierEnum : enum8 {
                kBlink = 0;
                kBreathe = 1;
            }

            request struct IdentifyRequest {
                int16u identifyTime = 0;
            }

            request struct TriggerEffectRequest {
                EffectIdentifierEnum effectIdentifier = 0;
                int8u effectVariant = 1;
            }

            attribute int16u identifyTime = 0;
            readonly attribute enum8 identifyType = 1;
            readonly attribute int16u clusterRevision = 65533;

            command access(invoke: manage) Identify(IdentifyRequest): DefaultSuccess = 0;
            command access(invoke: manage) TriggerEffect(TriggerEffectRequest): DefaultSuccess = 64;
        }

        endpoint 1 {
            device type ma_onofflight = 256, version 1;
            binding cluster OnOff;

            server cluster Identify {
                ram attribute identifyTime default = 0x0000;
                ram attribute identifyType default = 0x2;
                ram attribute clusterRevision default = 4;
                handle command Identify;
            }
        }
    "#;

    #[test]
    fn test_parse_cluster() {
        let idl = parse_unresolved(IDENTIFY, "identify.matter").unwrap();
        assert_eq!(idl.parse_file_name.as_deref(), Some("identify.matter"));
        assert_eq!(idl.clusters.len(), 1);

        let cluster = &idl.clusters[0];
        assert_eq!(cluster.name, "Identify");
        assert_eq!(cluster.code, 3);
        assert_eq!(cluster.side, ClusterSide::Server);
        assert_eq!(cluster.revision, 4);
        assert!(cluster.description.as_deref().unwrap().starts_with("Attributes and commands"));
        assert_eq!(cluster.enums[0].entries.len(), 2);
        assert_eq!(cluster.attributes.len(), 3);
        assert!(cluster.attribute("identifyType").unwrap().is_readonly());
        assert!(!cluster.attribute("identifyTime").unwrap().is_readonly());

        let command = cluster.command("TriggerEffect").unwrap();
        assert_eq!(command.code, 64);
        assert_eq!(command.invoke_acl, AccessPrivilege::Manage);
        assert_eq!(cluster.input_fields(command).len(), 2);
        assert_eq!(cluster.parse_meta.unwrap().line, 3);
    }

    #[test]
    fn test_parse_endpoint() {
        let idl = parse_unresolved(IDENTIFY, "identify.matter").unwrap();
        let endpoint = &idl.endpoints[0];
        assert_eq!(endpoint.number, 1);
        assert_eq!(endpoint.device_types[0].code, 256);
        assert_eq!(endpoint.client_bindings, vec!["OnOff".to_string()]);

        let identify = endpoint.server_cluster("Identify").unwrap();
        assert_eq!(identify.attributes.len(), 3);
        assert_eq!(identify.attributes[1].default, Some(DefaultValue::Integer(2)));
        assert_eq!(identify.commands, vec!["Identify".to_string()]);
    }

    #[test]
    fn test_field_qualities() {
        let idl = parse_unresolved(
            r#"
            fabric_scoped struct Target {
                optional nullable char_string<32> label = 1;
                fabric_sensitive int8u cluster[] = 2;
                fabric_idx fabricIndex = 254;
            }
            "#,
            "t.matter",
        )
        .unwrap();

        let s = &idl.global_structs[0];
        assert!(s.fabric_scoped);
        let label = s.field("label").unwrap();
        assert!(label.is_optional() && label.is_nullable());
        assert_eq!(label.data_type.max_length, Some(32));
        let cluster = s.field("cluster").unwrap();
        assert!(cluster.is_list);
        assert!(cluster.qualities.fabric_sensitive);
    }

    #[test]
    fn test_attribute_and_event_qualities() {
        let idl = parse_unresolved(
            r#"
            client cluster Basic = 40 {
                critical event StartUp = 0 { int32u softwareVersion = 0; }
                fabric_sensitive info event access(read: administer) Changed = 1 { }
                timed write attribute access(write: administer) int8u x = 0;
                readonly nosubscribe attribute int8u y = 1;
                provisional timed fabric command Reset(): DefaultSuccess = 2;
            }
            "#,
            "basic.matter",
        )
        .unwrap();

        let cluster = &idl.clusters[0];
        assert_eq!(cluster.side, ClusterSide::Client);
        assert_eq!(cluster.events[0].priority, EventPriority::Critical);
        assert!(cluster.events[1].fabric_sensitive);
        assert_eq!(cluster.events[1].read_acl, AccessPrivilege::Administer);

        let x = cluster.attribute("x").unwrap();
        assert!(x.qualities.timed_write);
        assert_eq!(x.write_acl, AccessPrivilege::Administer);
        assert!(cluster.attribute("y").unwrap().qualities.nosubscribe);

        let reset = cluster.command("Reset").unwrap();
        assert!(reset.qualities.timed_invoke && reset.qualities.fabric_scoped);
        assert_eq!(reset.input_param, None);
        assert_eq!(reset.api_maturity, ApiMaturity::Provisional);
    }

    #[test]
    fn test_error_reports_location() {
        let err = parse_unresolved("server cluster Foo = 1 {\n  attribute int8u x = ;\n}", "foo.matter")
            .unwrap_err();
        match err {
            IdlError::Parse { file, line, message, .. } => {
                assert_eq!(file, "foo.matter");
                assert_eq!(line, 2);
                assert!(message.contains("expected integer"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_response_struct_requires_id() {
        assert!(parse_unresolved("response struct R { }", "r.matter").is_err());
        assert!(parse_unresolved("response struct R = 1 { }", "r.matter").is_ok());
    }

    #[test]
    fn test_user_types_named_like_xml_aliases() {
        let idl = parse(
            r#"
            struct String { int8u a = 0; }
            server cluster Demo = 1 {
                enum Float : enum8 { kOne = 1; }
                attribute String s = 0;
                attribute Float f = 1;
            }
            "#,
            "demo.matter",
        )
        .unwrap();
        let cluster = &idl.clusters[0];
        assert_eq!(cluster.attribute("s").unwrap().definition.data_type.name, "String");
        assert_eq!(cluster.attribute("f").unwrap().definition.data_type.name, "Float");
    }
}

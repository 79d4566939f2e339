use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::Sink;
use futures::stream;
use pgwire::api::auth::cleartext::CleartextPasswordAuthStartupHandler;
use pgwire::api::auth::{DefaultServerParameterProvider, StartupHandler};
use pgwire::api::copy::CopyHandler;
use pgwire::api::portal::{Format, Portal};
use pgwire::api::query::{ExtendedQueryHandler, SimpleQueryHandler};
use pgwire::api::results::{
    DataRowEncoder, DescribePortalResponse, DescribeStatementResponse, FieldFormat, FieldInfo,
    QueryResponse, Response, Tag,
};
use pgwire::api::stmt::{QueryParser, StoredStatement};
use pgwire::api::store::PortalStore;
use pgwire::api::{ClientInfo, ClientPortalStore, NoopHandler, PgWireServerHandlers, Type};
use pgwire::error::{ErrorInfo, PgWireError, PgWireResult};
use pgwire::messages::PgWireBackendMessage;
use pgwire::tokio::TlsAcceptor;
use tokio::net::TcpStream;

use crate::auth::AulaAuthSource;
use crate::engine::{Engine, Slot, SlotState};
use crate::model::*;
use crate::observability;
use crate::sql::{self, Command};

pub struct AulaHandler {
    engine: Arc<Engine>,
    query_parser: Arc<AulaQueryParser>,
}

impl AulaHandler {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            query_parser: Arc::new(AulaQueryParser),
        }
    }

    async fn execute_command(&self, cmd: Command) -> PgWireResult<Vec<Response>> {
        let label = observability::command_label(&cmd);
        let start = Instant::now();
        let result = self.dispatch(cmd).await;
        metrics::histogram!(observability::QUERY_DURATION_SECONDS, "command" => label)
            .record(start.elapsed().as_secs_f64());
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(observability::QUERIES_TOTAL, "command" => label, "status" => status)
            .increment(1);
        result
    }

    async fn dispatch(&self, cmd: Command) -> PgWireResult<Vec<Response>> {
        match cmd {
            Command::RegisterUser { user } => {
                self.engine.register_user(user).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("INSERT").with_rows(1))])
            }
            Command::AddBuilding { id, name } => {
                self.engine
                    .add_building(id, name)
                    .await
                    .map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("INSERT").with_rows(1))])
            }
            Command::RemoveBuilding { id } => {
                self.engine.remove_building(id).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("DELETE").with_rows(1))])
            }
            Command::AddFloor {
                id,
                building_id,
                number,
            } => {
                self.engine
                    .add_floor(id, building_id, number)
                    .await
                    .map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("INSERT").with_rows(1))])
            }
            Command::RemoveFloor { id } => {
                self.engine.remove_floor(id).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("DELETE").with_rows(1))])
            }
            Command::AddRoom { room } => {
                self.engine.add_room(room).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("INSERT").with_rows(1))])
            }
            Command::RemoveRoom { id } => {
                self.engine.remove_room(id).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("DELETE").with_rows(1))])
            }
            Command::RequestBooking {
                id,
                user_id,
                room_id,
                start,
                end,
                purpose,
                resources,
            } => {
                self.engine
                    .create_booking(id, user_id, room_id, start, end, purpose, resources)
                    .await
                    .map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("INSERT").with_rows(1))])
            }
            Command::CancelBooking { id, user_id } => {
                self.engine
                    .cancel_booking(id, user_id)
                    .await
                    .map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("UPDATE").with_rows(1))])
            }
            Command::ApproveBooking { id } => {
                self.engine.approve_booking(id).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("UPDATE").with_rows(1))])
            }
            Command::RejectBooking { id } => {
                self.engine.reject_booking(id).await.map_err(engine_err)?;
                Ok(vec![Response::Execution(Tag::new("UPDATE").with_rows(1))])
            }
            Command::SelectSlots { room_id, day } => {
                let slots = self
                    .engine
                    .day_view(room_id, day)
                    .await
                    .map_err(engine_err)?;
                Ok(vec![slots_response(slots)])
            }
            Command::SelectBookings { user_id, status } => {
                let bookings = self.engine.bookings_filtered(user_id, status).await;
                Ok(vec![bookings_response(bookings)])
            }
            Command::SelectRooms => {
                let rooms = self.engine.list_rooms().await;
                Ok(vec![rooms_response(rooms)])
            }
            Command::SelectStats => {
                let stats = self.engine.stats().await;
                Ok(vec![stats_response(stats)])
            }
        }
    }
}

// ── Row schemas & encoding ───────────────────────────────────────

fn text_field(name: &str, ty: Type) -> FieldInfo {
    FieldInfo::new(name.into(), None, None, ty, FieldFormat::Text)
}

fn slots_schema() -> Vec<FieldInfo> {
    vec![
        text_field("start", Type::INT8),
        text_field("end", Type::INT8),
        text_field("label", Type::VARCHAR),
        text_field("status", Type::VARCHAR),
        text_field("booked_by", Type::VARCHAR),
        text_field("role", Type::VARCHAR),
    ]
}

fn slots_response(slots: Vec<Slot>) -> Response {
    let schema = Arc::new(slots_schema());
    let rows: Vec<PgWireResult<_>> = slots
        .into_iter()
        .map(|slot| {
            let mut encoder = DataRowEncoder::new(schema.clone());
            encoder.encode_field(&slot.span.start)?;
            encoder.encode_field(&slot.span.end)?;
            encoder.encode_field(&slot.label)?;
            match slot.state {
                SlotState::Available => {
                    encoder.encode_field(&"AVAILABLE")?;
                    encoder.encode_field(&None::<&str>)?;
                    encoder.encode_field(&None::<&str>)?;
                }
                SlotState::Booked {
                    booked_by,
                    owner_class,
                } => {
                    encoder.encode_field(&"BOOKED")?;
                    encoder.encode_field(&booked_by)?;
                    encoder.encode_field(&owner_class.as_str())?;
                }
            }
            Ok(encoder.take_row())
        })
        .collect();

    Response::Query(QueryResponse::new(schema, stream::iter(rows)))
}

fn bookings_schema() -> Vec<FieldInfo> {
    vec![
        text_field("id", Type::VARCHAR),
        text_field("user_id", Type::VARCHAR),
        text_field("room_id", Type::VARCHAR),
        text_field("start", Type::INT8),
        text_field("end", Type::INT8),
        text_field("purpose", Type::VARCHAR),
        text_field("resources", Type::VARCHAR),
        text_field("status", Type::VARCHAR),
    ]
}

fn bookings_response(bookings: Vec<Booking>) -> Response {
    let schema = Arc::new(bookings_schema());
    let rows: Vec<PgWireResult<_>> = bookings
        .into_iter()
        .map(|b| {
            let mut encoder = DataRowEncoder::new(schema.clone());
            encoder.encode_field(&b.id.to_string())?;
            encoder.encode_field(&b.user_id.to_string())?;
            encoder.encode_field(&b.room_id.to_string())?;
            encoder.encode_field(&b.span.start)?;
            encoder.encode_field(&b.span.end)?;
            encoder.encode_field(&b.purpose)?;
            encoder.encode_field(&b.resources)?;
            encoder.encode_field(&b.status.as_str())?;
            Ok(encoder.take_row())
        })
        .collect();

    Response::Query(QueryResponse::new(schema, stream::iter(rows)))
}

fn rooms_schema() -> Vec<FieldInfo> {
    vec![
        text_field("id", Type::VARCHAR),
        text_field("floor_id", Type::VARCHAR),
        text_field("name", Type::VARCHAR),
        text_field("capacity", Type::INT8),
        text_field("kind", Type::VARCHAR),
        text_field("resources", Type::VARCHAR),
    ]
}

fn rooms_response(rooms: Vec<Room>) -> Response {
    let schema = Arc::new(rooms_schema());
    let rows: Vec<PgWireResult<_>> = rooms
        .into_iter()
        .map(|r| {
            let mut encoder = DataRowEncoder::new(schema.clone());
            encoder.encode_field(&r.id.to_string())?;
            encoder.encode_field(&r.floor_id.to_string())?;
            encoder.encode_field(&r.name)?;
            encoder.encode_field(&(r.capacity as i64))?;
            encoder.encode_field(&r.kind.as_str())?;
            encoder.encode_field(&r.fixed_resources)?;
            Ok(encoder.take_row())
        })
        .collect();

    Response::Query(QueryResponse::new(schema, stream::iter(rows)))
}

fn stats_schema() -> Vec<FieldInfo> {
    vec![
        text_field("buildings", Type::INT8),
        text_field("rooms", Type::INT8),
        text_field("pending", Type::INT8),
    ]
}

fn stats_response(stats: CampusStats) -> Response {
    let schema = Arc::new(stats_schema());
    let mut encoder = DataRowEncoder::new(schema.clone());
    let row: PgWireResult<_> = (|| {
        encoder.encode_field(&(stats.buildings as i64))?;
        encoder.encode_field(&(stats.rooms as i64))?;
        encoder.encode_field(&(stats.pending_bookings as i64))?;
        Ok(encoder.take_row())
    })();

    Response::Query(QueryResponse::new(schema, stream::iter(vec![row])))
}

#[async_trait]
impl SimpleQueryHandler for AulaHandler {
    async fn do_query<C>(&self, _client: &mut C, query: &str) -> PgWireResult<Vec<Response>>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let cmd = sql::parse_sql(query).map_err(sql_err)?;
        self.execute_command(cmd).await
    }
}

// ── Extended Query Protocol ──────────────────────────────────────

#[derive(Debug)]
pub struct AulaQueryParser;

#[async_trait]
impl QueryParser for AulaQueryParser {
    type Statement = String;

    async fn parse_sql<C>(
        &self,
        _client: &C,
        sql: &str,
        _types: &[Option<Type>],
    ) -> PgWireResult<String>
    where
        C: ClientInfo + Unpin + Send + Sync,
    {
        Ok(sql.to_string())
    }

    fn get_parameter_types(&self, stmt: &String) -> PgWireResult<Vec<Type>> {
        Ok(vec![Type::VARCHAR; count_params(stmt)])
    }

    fn get_result_schema(
        &self,
        stmt: &String,
        _column_format: Option<&Format>,
    ) -> PgWireResult<Vec<FieldInfo>> {
        Ok(select_schema_for(stmt).unwrap_or_default())
    }
}

/// Schema for a SELECT statement, keyed by the table keyword.
fn select_schema_for(stmt: &str) -> Option<Vec<FieldInfo>> {
    let upper = stmt.to_uppercase();
    if !upper.contains("SELECT") {
        return None;
    }
    if upper.contains("SLOTS") {
        Some(slots_schema())
    } else if upper.contains("BOOKINGS") {
        Some(bookings_schema())
    } else if upper.contains("ROOMS") {
        Some(rooms_schema())
    } else if upper.contains("STATS") {
        Some(stats_schema())
    } else {
        None
    }
}

#[async_trait]
impl ExtendedQueryHandler for AulaHandler {
    type Statement = String;
    type QueryParser = AulaQueryParser;

    fn query_parser(&self) -> Arc<Self::QueryParser> {
        self.query_parser.clone()
    }

    async fn do_query<C>(
        &self,
        _client: &mut C,
        portal: &Portal<Self::Statement>,
        _max_rows: usize,
    ) -> PgWireResult<Response>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let sql = substitute_params(portal);
        let cmd = sql::parse_sql(&sql).map_err(sql_err)?;
        let mut responses = self.execute_command(cmd).await?;
        Ok(responses.remove(0))
    }

    async fn do_describe_statement<C>(
        &self,
        _client: &mut C,
        target: &StoredStatement<Self::Statement>,
    ) -> PgWireResult<DescribeStatementResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let param_types = vec![Type::VARCHAR; count_params(&target.statement)];
        let schema = select_schema_for(&target.statement).unwrap_or_default();
        Ok(DescribeStatementResponse::new(param_types, schema))
    }

    async fn do_describe_portal<C>(
        &self,
        _client: &mut C,
        target: &Portal<Self::Statement>,
    ) -> PgWireResult<DescribePortalResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let schema = select_schema_for(&target.statement.statement).unwrap_or_default();
        Ok(DescribePortalResponse::new(schema))
    }
}

/// Count the highest $N parameter placeholder in the SQL string.
fn count_params(sql: &str) -> usize {
    let mut max = 0usize;
    let bytes = sql.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            i += 1;
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i > start {
                if let Ok(n) = sql[start..i].parse::<usize>() {
                    if n > max {
                        max = n;
                    }
                }
            }
        } else {
            i += 1;
        }
    }
    max
}

/// Substitute $1, $2, ... placeholders with bound parameter values (text format).
fn substitute_params(portal: &Portal<String>) -> String {
    let sql = portal.statement.statement.to_string();
    let params = &portal.parameters;
    let mut result = sql;

    for (i, param) in params.iter().enumerate().rev() {
        let placeholder = format!("${}", i + 1);
        let value = match param {
            Some(bytes) => {
                let text = String::from_utf8_lossy(bytes);
                format!("'{}'", text.replace('\'', "''"))
            }
            None => "NULL".to_string(),
        };
        result = result.replace(&placeholder, &value);
    }

    result
}

// ── Factory ──────────────────────────────────────────────────────

pub struct AulaFactory {
    handler: Arc<AulaHandler>,
    auth_handler:
        Arc<CleartextPasswordAuthStartupHandler<AulaAuthSource, DefaultServerParameterProvider>>,
    noop: Arc<NoopHandler>,
}

impl AulaFactory {
    pub fn new(engine: Arc<Engine>, password: String) -> Self {
        let auth_source = AulaAuthSource::new(password);
        let param_provider = DefaultServerParameterProvider::default();
        Self {
            handler: Arc::new(AulaHandler::new(engine)),
            auth_handler: Arc::new(CleartextPasswordAuthStartupHandler::new(
                auth_source,
                param_provider,
            )),
            noop: Arc::new(NoopHandler),
        }
    }
}

impl PgWireServerHandlers for AulaFactory {
    fn simple_query_handler(&self) -> Arc<impl SimpleQueryHandler> {
        self.handler.clone()
    }

    fn extended_query_handler(&self) -> Arc<impl ExtendedQueryHandler> {
        self.handler.clone()
    }

    fn startup_handler(&self) -> Arc<impl StartupHandler> {
        self.auth_handler.clone()
    }

    fn copy_handler(&self) -> Arc<impl CopyHandler> {
        self.noop.clone()
    }
}

/// Drive one client connection to completion.
pub async fn process_connection(
    socket: TcpStream,
    engine: Arc<Engine>,
    password: String,
    tls: Option<TlsAcceptor>,
) -> std::io::Result<()> {
    let factory = Arc::new(AulaFactory::new(engine, password));
    pgwire::tokio::process_socket(socket, tls, factory).await
}

fn engine_err(e: crate::engine::EngineError) -> PgWireError {
    PgWireError::UserError(Box::new(ErrorInfo::new(
        "ERROR".into(),
        "P0001".into(),
        e.to_string(),
    )))
}

fn sql_err(e: crate::sql::SqlError) -> PgWireError {
    PgWireError::UserError(Box::new(ErrorInfo::new(
        "ERROR".into(),
        "42601".into(),
        e.to_string(),
    )))
}

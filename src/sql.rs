use sqlparser::ast::{self, Expr, FromTable, ObjectNamePart, SetExpr, Statement, TableFactor, TableObject, Value, ValueWithSpan};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use ulid::Ulid;

use crate::model::*;

/// Parsed command from SQL input.
#[derive(Debug, PartialEq)]
pub enum Command {
    RegisterUser {
        user: User,
    },
    AddBuilding {
        id: Ulid,
        name: String,
    },
    RemoveBuilding {
        id: Ulid,
    },
    AddFloor {
        id: Ulid,
        building_id: Ulid,
        number: u32,
    },
    RemoveFloor {
        id: Ulid,
    },
    AddRoom {
        room: Room,
    },
    RemoveRoom {
        id: Ulid,
    },
    RequestBooking {
        id: Ulid,
        user_id: Ulid,
        room_id: Ulid,
        start: Ms,
        end: Ms,
        purpose: String,
        resources: String,
    },
    CancelBooking {
        id: Ulid,
        user_id: Ulid,
    },
    ApproveBooking {
        id: Ulid,
    },
    RejectBooking {
        id: Ulid,
    },
    SelectSlots {
        room_id: Ulid,
        day: Ms,
    },
    SelectBookings {
        user_id: Option<Ulid>,
        status: Option<BookingStatus>,
    },
    SelectRooms,
    SelectStats,
}

pub fn parse_sql(sql: &str) -> Result<Command, SqlError> {
    let dialect = PostgreSqlDialect {};
    let stmts = Parser::parse_sql(&dialect, sql).map_err(|e| SqlError::Parse(e.to_string()))?;
    if stmts.is_empty() {
        return Err(SqlError::Empty);
    }

    match &stmts[0] {
        Statement::Insert(insert) => parse_insert(insert),
        Statement::Delete(delete) => parse_delete(delete),
        Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => parse_update(table, assignments, selection),
        Statement::Query(query) => parse_select(query),
        other => Err(SqlError::Unsupported(format!("{other}"))),
    }
}

fn parse_insert(insert: &ast::Insert) -> Result<Command, SqlError> {
    let table = insert_table_name(insert)?;
    let values = extract_insert_values(insert)?;

    match table.as_str() {
        "users" => {
            if values.len() < 5 {
                return Err(SqlError::WrongArity("users", 5, values.len()));
            }
            let id = parse_ulid(&values[0])?;
            let name = parse_string(&values[1])?;
            let email = parse_string(&values[2])?;
            let role_tag = parse_string(&values[3])?.to_uppercase();
            let member_id = parse_string(&values[4])?;

            let role = match role_tag.as_str() {
                "STUDENT" => {
                    if values.len() < 7 {
                        return Err(SqlError::WrongArity("users (student)", 7, values.len()));
                    }
                    Role::Student {
                        student_id: member_id,
                        branch: parse_string(&values[5])?,
                        program: parse_string(&values[6])?,
                    }
                }
                "FACULTY" => {
                    if values.len() < 6 {
                        return Err(SqlError::WrongArity("users (faculty)", 6, values.len()));
                    }
                    Role::Faculty {
                        employee_id: member_id,
                        department: parse_string(&values[5])?,
                    }
                }
                "ADMIN" => Role::Admin {
                    employee_id: member_id,
                },
                other => return Err(SqlError::Parse(format!("unknown role: {other}"))),
            };

            Ok(Command::RegisterUser {
                user: User {
                    id,
                    name,
                    email,
                    role,
                },
            })
        }
        "buildings" => {
            if values.len() < 2 {
                return Err(SqlError::WrongArity("buildings", 2, values.len()));
            }
            Ok(Command::AddBuilding {
                id: parse_ulid(&values[0])?,
                name: parse_string(&values[1])?,
            })
        }
        "floors" => {
            if values.len() < 3 {
                return Err(SqlError::WrongArity("floors", 3, values.len()));
            }
            Ok(Command::AddFloor {
                id: parse_ulid(&values[0])?,
                building_id: parse_ulid(&values[1])?,
                number: parse_u32(&values[2])?,
            })
        }
        "rooms" => {
            if values.len() < 5 {
                return Err(SqlError::WrongArity("rooms", 5, values.len()));
            }
            let id = parse_ulid(&values[0])?;
            let floor_id = parse_ulid(&values[1])?;
            let name = parse_string(&values[2])?;
            let capacity = parse_u32(&values[3])?;
            let kind_tag = parse_string(&values[4])?.to_uppercase();

            let kind = match kind_tag.as_str() {
                "CLASSROOM" => RoomKind::Classroom {
                    has_smart_board: if values.len() >= 6 {
                        parse_bool(&values[5])?
                    } else {
                        false
                    },
                },
                "LAB" => RoomKind::Lab {
                    lab_type: if values.len() >= 6 {
                        parse_string(&values[5])?
                    } else {
                        "General Lab".into()
                    },
                },
                other => return Err(SqlError::Parse(format!("unknown room kind: {other}"))),
            };
            let fixed_resources = if values.len() >= 7 {
                parse_string(&values[6])?
            } else {
                String::new()
            };

            Ok(Command::AddRoom {
                room: Room {
                    id,
                    floor_id,
                    name,
                    capacity,
                    kind,
                    fixed_resources,
                },
            })
        }
        "bookings" => {
            if values.len() < 5 {
                return Err(SqlError::WrongArity("bookings", 5, values.len()));
            }
            Ok(Command::RequestBooking {
                id: parse_ulid(&values[0])?,
                user_id: parse_ulid(&values[1])?,
                room_id: parse_ulid(&values[2])?,
                start: parse_i64(&values[3])?,
                end: parse_i64(&values[4])?,
                purpose: if values.len() >= 6 {
                    parse_string(&values[5])?
                } else {
                    String::new()
                },
                resources: if values.len() >= 7 {
                    parse_string(&values[6])?
                } else {
                    String::new()
                },
            })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn parse_delete(delete: &ast::Delete) -> Result<Command, SqlError> {
    let table = delete_table_name(delete)?;
    if table == "bookings" {
        // Bookings are never deleted, only transitioned.
        return Err(SqlError::Unsupported(
            "bookings are cancelled via UPDATE, not deleted".into(),
        ));
    }
    let id = extract_where_id(&delete.selection)?;

    match table.as_str() {
        "buildings" => Ok(Command::RemoveBuilding { id }),
        "floors" => Ok(Command::RemoveFloor { id }),
        "rooms" => Ok(Command::RemoveRoom { id }),
        _ => Err(SqlError::UnknownTable(table)),
    }
}

/// `UPDATE bookings SET status = '…' WHERE id = '…' [AND user_id = '…']`
/// is the lifecycle surface: CANCELLED needs the caller's user_id,
/// CONFIRMED/REJECTED are the admin approve/reject operations.
fn parse_update(
    table: &ast::TableWithJoins,
    assignments: &[ast::Assignment],
    selection: &Option<Expr>,
) -> Result<Command, SqlError> {
    let table = table_factor_name(&table.relation)?;
    if table != "bookings" {
        return Err(SqlError::UnknownTable(table));
    }

    let mut status: Option<String> = None;
    for assignment in assignments {
        if assignment_column(assignment).as_deref() == Some("status") {
            status = Some(parse_string(&assignment.value)?.to_uppercase());
        }
    }
    let status = status.ok_or(SqlError::MissingFilter("status"))?;

    let mut filters = Vec::new();
    if let Some(sel) = selection {
        collect_eq_filters(sel, &mut filters);
    }
    let id = take_ulid_filter(&filters, "id")?.ok_or(SqlError::MissingFilter("id"))?;

    match status.as_str() {
        "CANCELLED" => {
            let user_id =
                take_ulid_filter(&filters, "user_id")?.ok_or(SqlError::MissingFilter("user_id"))?;
            Ok(Command::CancelBooking { id, user_id })
        }
        "CONFIRMED" => Ok(Command::ApproveBooking { id }),
        "REJECTED" => Ok(Command::RejectBooking { id }),
        other => Err(SqlError::Unsupported(format!(
            "cannot set booking status to {other}"
        ))),
    }
}

fn parse_select(query: &ast::Query) -> Result<Command, SqlError> {
    let select = match query.body.as_ref() {
        SetExpr::Select(s) => s,
        _ => return Err(SqlError::Unsupported("non-SELECT query".into())),
    };

    if select.from.is_empty() {
        return Err(SqlError::Parse("SELECT without FROM".into()));
    }
    let table = table_factor_name(&select.from[0].relation)?;

    let mut filters = Vec::new();
    if let Some(selection) = &select.selection {
        collect_eq_filters(selection, &mut filters);
    }

    match table.as_str() {
        "slots" => Ok(Command::SelectSlots {
            room_id: take_ulid_filter(&filters, "room_id")?
                .ok_or(SqlError::MissingFilter("room_id"))?,
            day: take_i64_filter(&filters, "day")?.ok_or(SqlError::MissingFilter("day"))?,
        }),
        "bookings" => {
            let status = match take_string_filter(&filters, "status")? {
                Some(s) => Some(
                    BookingStatus::parse(&s)
                        .ok_or_else(|| SqlError::Parse(format!("unknown status: {s}")))?,
                ),
                None => None,
            };
            Ok(Command::SelectBookings {
                user_id: take_ulid_filter(&filters, "user_id")?,
                status,
            })
        }
        "rooms" => Ok(Command::SelectRooms),
        "stats" => Ok(Command::SelectStats),
        _ => Err(SqlError::UnknownTable(table)),
    }
}

// ── Helpers ───────────────────────────────────────────────────

fn object_name_last(name: &ast::ObjectName) -> Option<String> {
    name.0.last().and_then(|part| match part {
        ObjectNamePart::Identifier(ident) => Some(ident.value.to_lowercase()),
        _ => None,
    })
}

fn insert_table_name(insert: &ast::Insert) -> Result<String, SqlError> {
    match &insert.table {
        TableObject::TableName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("unsupported table object in INSERT".into())),
    }
}

fn delete_table_name(delete: &ast::Delete) -> Result<String, SqlError> {
    let tables_with_joins = match &delete.from {
        FromTable::WithFromKeyword(t) | FromTable::WithoutKeyword(t) => t,
    };
    if let Some(first) = tables_with_joins.first() {
        table_factor_name(&first.relation)
    } else {
        Err(SqlError::Parse("DELETE without table".into()))
    }
}

fn table_factor_name(tf: &TableFactor) -> Result<String, SqlError> {
    match tf {
        TableFactor::Table { name, .. } => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("complex table expression".into())),
    }
}

fn assignment_column(assignment: &ast::Assignment) -> Option<String> {
    match &assignment.target {
        ast::AssignmentTarget::ColumnName(name) => object_name_last(name),
        _ => None,
    }
}

fn extract_insert_values(insert: &ast::Insert) -> Result<Vec<Expr>, SqlError> {
    let body = insert
        .source
        .as_ref()
        .ok_or(SqlError::Parse("no VALUES".into()))?;
    match body.body.as_ref() {
        SetExpr::Values(values) => {
            if values.rows.is_empty() {
                return Err(SqlError::Parse("empty VALUES".into()));
            }
            if values.rows.len() > 1 {
                return Err(SqlError::Unsupported("multi-row INSERT".into()));
            }
            Ok(values.rows[0].clone())
        }
        _ => Err(SqlError::Parse("expected VALUES".into())),
    }
}

/// Walk a WHERE clause collecting `column = value` pairs joined by AND.
fn collect_eq_filters(expr: &Expr, out: &mut Vec<(String, Expr)>) {
    if let Expr::BinaryOp { left, op, right } = expr {
        match op {
            ast::BinaryOperator::And => {
                collect_eq_filters(left, out);
                collect_eq_filters(right, out);
            }
            ast::BinaryOperator::Eq => {
                if let Some(col) = expr_column_name(left) {
                    out.push((col, (**right).clone()));
                }
            }
            _ => {}
        }
    }
}

fn take_ulid_filter(filters: &[(String, Expr)], col: &str) -> Result<Option<Ulid>, SqlError> {
    match filters.iter().find(|(c, _)| c == col) {
        Some((_, expr)) => Ok(Some(parse_ulid(expr)?)),
        None => Ok(None),
    }
}

fn take_i64_filter(filters: &[(String, Expr)], col: &str) -> Result<Option<i64>, SqlError> {
    match filters.iter().find(|(c, _)| c == col) {
        Some((_, expr)) => Ok(Some(parse_i64(expr)?)),
        None => Ok(None),
    }
}

fn take_string_filter(filters: &[(String, Expr)], col: &str) -> Result<Option<String>, SqlError> {
    match filters.iter().find(|(c, _)| c == col) {
        Some((_, expr)) => Ok(Some(parse_string(expr)?)),
        None => Ok(None),
    }
}

fn extract_where_id(selection: &Option<Expr>) -> Result<Ulid, SqlError> {
    let sel = selection.as_ref().ok_or(SqlError::MissingFilter("id"))?;
    let mut filters = Vec::new();
    collect_eq_filters(sel, &mut filters);
    take_ulid_filter(&filters, "id")?.ok_or(SqlError::MissingFilter("id"))
}

fn expr_column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.to_lowercase()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.to_lowercase()),
        _ => None,
    }
}

fn extract_value(expr: &Expr) -> Option<&Value> {
    match expr {
        Expr::Value(ValueWithSpan { value, .. }) => Some(value),
        _ => None,
    }
}

fn parse_ulid(expr: &Expr) -> Result<Ulid, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::SingleQuotedString(s) | Value::Number(s, _) => {
                Ulid::from_string(s).map_err(|e| SqlError::Parse(format!("bad ULID: {e}")))
            }
            _ => Err(SqlError::Parse(format!("expected string, got {value:?}"))),
        }
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

fn parse_string(expr: &Expr) -> Result<String, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::SingleQuotedString(s) => Ok(s.clone()),
            Value::Number(s, _) => Ok(s.clone()),
            _ => Err(SqlError::Parse(format!("expected string, got {value:?}"))),
        }
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

fn parse_i64(expr: &Expr) -> Result<i64, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::Number(s, _) => s
                .parse()
                .map_err(|e| SqlError::Parse(format!("bad i64: {e}"))),
            Value::SingleQuotedString(s) => s
                .parse()
                .map_err(|e| SqlError::Parse(format!("bad i64: {e}"))),
            _ => Err(SqlError::Parse(format!("expected number, got {value:?}"))),
        }
    } else if let Expr::UnaryOp {
        op: ast::UnaryOperator::Minus,
        expr,
    } = expr
    {
        Ok(-parse_i64(expr)?)
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

fn parse_u32(expr: &Expr) -> Result<u32, SqlError> {
    let v = parse_i64(expr)?;
    u32::try_from(v).map_err(|_| SqlError::Parse(format!("{v} out of u32 range")))
}

fn parse_bool(expr: &Expr) -> Result<bool, SqlError> {
    if let Some(value) = extract_value(expr) {
        match value {
            Value::Boolean(b) => Ok(*b),
            Value::SingleQuotedString(s) => match s.to_lowercase().as_str() {
                "true" | "t" | "1" => Ok(true),
                "false" | "f" | "0" => Ok(false),
                _ => Err(SqlError::Parse(format!("bad bool: {s}"))),
            },
            Value::Number(n, _) => Ok(n != "0"),
            _ => Err(SqlError::Parse(format!("expected bool, got {value:?}"))),
        }
    } else {
        Err(SqlError::Parse(format!("expected value, got {expr:?}")))
    }
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum SqlError {
    Parse(String),
    Empty,
    Unsupported(String),
    UnknownTable(String),
    WrongArity(&'static str, usize, usize),
    MissingFilter(&'static str),
}

impl std::fmt::Display for SqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlError::Parse(s) => write!(f, "parse error: {s}"),
            SqlError::Empty => write!(f, "empty query"),
            SqlError::Unsupported(s) => write!(f, "unsupported: {s}"),
            SqlError::UnknownTable(t) => write!(f, "unknown table: {t}"),
            SqlError::WrongArity(t, expected, got) => {
                write!(f, "{t}: expected {expected} values, got {got}")
            }
            SqlError::MissingFilter(col) => write!(f, "missing filter: {col}"),
        }
    }
}

impl std::error::Error for SqlError {}

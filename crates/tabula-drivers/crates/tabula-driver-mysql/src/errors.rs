//! MySQL server error classification

use tabula_core::TabulaError;

// ER_DB_CREATE_EXISTS, ER_TABLE_EXISTS_ERROR, ER_DUP_KEYNAME, ER_FK_DUP_NAME
const ALREADY_EXISTS: &[u16] = &[1007, 1050, 1061, 1826];

// ER_DB_DROP_EXISTS, ER_BAD_DB_ERROR, ER_BAD_TABLE_ERROR,
// ER_CANT_DROP_FIELD_OR_KEY, ER_NO_SUCH_TABLE
const NOT_FOUND: &[u16] = &[1008, 1049, 1051, 1091, 1146];

// ER_CANT_CREATE_TABLE (errno 150), ER_CANNOT_ADD_FOREIGN, ER_NO_REFERENCED_ROW,
// ER_ROW_IS_REFERENCED, ER_ROW_IS_REFERENCED_2, ER_NO_REFERENCED_ROW_2,
// ER_FK_NO_INDEX_PARENT, ER_FK_CANNOT_OPEN_PARENT, ER_FK_COLUMN_NOT_NULL,
// ER_FK_CANNOT_DROP_PARENT, ER_FK_COLUMN_CANNOT_DROP, ER_FK_COLUMN_CANNOT_DROP_CHILD,
// ER_FK_NO_COLUMN_PARENT, ER_FK_INCOMPATIBLE_COLUMNS
const REFERENTIAL: &[u16] = &[
    1005, 1215, 1216, 1217, 1451, 1452, 1822, 1824, 1830, 3730, 3732, 3733, 3734, 3780,
];

/// Map a MySQL server error code onto the shared error taxonomy
pub fn classify_server_error(code: u16, message: &str) -> TabulaError {
    let detail = format!("{} (MySQL error {})", message, code);
    if ALREADY_EXISTS.contains(&code) {
        TabulaError::AlreadyExists(detail)
    } else if NOT_FOUND.contains(&code) {
        TabulaError::NotFound(detail)
    } else if REFERENTIAL.contains(&code) {
        TabulaError::Referential(detail)
    } else {
        TabulaError::Transport(detail)
    }
}

pub(crate) fn map_mysql_error(err: mysql_async::Error) -> TabulaError {
    match err {
        mysql_async::Error::Server(server) => {
            tracing::debug!(code = server.code, state = %server.state, "MySQL server error");
            classify_server_error(server.code, &server.message)
        }
        other => TabulaError::Transport(other.to_string()),
    }
}

use super::*;

#[test]
fn test_every_dialect_parses_plain_select() {
    for dialect in SqlDialect::ALL {
        let stmts = dialect.parse("SELECT id FROM users").unwrap();
        assert_eq!(stmts.len(), 1, "dialect {}", dialect);
    }
}

#[test]
fn test_from_name_aliases() {
    assert_eq!(SqlDialect::from_name("DuckDB").unwrap(), SqlDialect::DuckDb);
    assert_eq!(
        SqlDialect::from_name("postgresql").unwrap(),
        SqlDialect::Postgres
    );
    assert_eq!(SqlDialect::from_name("tsql").unwrap(), SqlDialect::MsSql);
    assert!(matches!(
        SqlDialect::from_name("cobol"),
        Err(SqlError::UnknownDialect(_))
    ));
}

#[test]
fn test_name_round_trips_through_from_name() {
    for dialect in SqlDialect::ALL {
        assert_eq!(SqlDialect::from_name(dialect.name()).unwrap(), dialect);
    }
}

#[test]
fn test_parse_error_location() {
    let result = SqlDialect::DuckDb.parse("SELECT\nFROM users");
    match result {
        Err(SqlError::ParseError { line, message, .. }) => {
            assert_eq!(line, 2, "unexpected line in message: {}", message);
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_parse_location_extraction() {
    let (line, col) = parse_location_from_error("Expected: something at Line: 5, Column: 10");
    assert_eq!(line, 5);
    assert_eq!(col, 10);

    let (line, col) = parse_location_from_error("Some error without location");
    assert_eq!(line, 0);
    assert_eq!(col, 0);
}

#[test]
fn test_dialect_deserializes_lowercase() {
    let dialect: SqlDialect = serde_json::from_str("\"snowflake\"").unwrap();
    assert_eq!(dialect, SqlDialect::Snowflake);
}

//! Pruebas del fetcher contra Postgres. La prueba de consulta requiere
//! DATABASE_URL válido; la de degradación no necesita base de datos.

use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::Connection;
use inventory_domain::HostSource;
use inventory_persistence::{build_pool, load_hosts, DbConfig, HostQuery, PersistenceError, PgHostFetcher, PoolProvider};

#[test]
fn unreachable_database_degrades_to_empty() {
    let cfg = DbConfig { host: Some("127.0.0.1".into()),
                         port: Some(1),
                         dbname: Some("inventory".into()),
                         connect_timeout: Duration::from_secs(1),
                         ..Default::default() };
    let pool = build_pool(&cfg).expect("pool");
    let fetcher = PgHostFetcher::new(PoolProvider { pool }, HostQuery::default());
    assert!(matches!(fetcher.try_fetch_hosts(), Err(PersistenceError::Connection(_))));
    assert!(fetcher.fetch_hosts().is_empty());
}

const FIXTURE: &str = r#"
CREATE SCHEMA IF NOT EXISTS dbo;
CREATE TABLE dbo."Datasource" ("DatasourceId" int, "Name" text, "ConnectionTypeId" int);
CREATE TABLE dbo."ObjectInventory" ("Id" int, "DatasourceId" int, "CacheGroup" int);
CREATE TABLE dbo."Objects" ("ObjectId" text, "ObjectName" text, "InventoryId" int, "SystemEntityId" int, "Object" text);
INSERT INTO dbo."Datasource" VALUES (1, 'vcenter-01', 5), (2, 'legacy', 99);
INSERT INTO dbo."ObjectInventory" VALUES (10, 1, 4), (11, 1, 7), (12, 2, 4);
INSERT INTO dbo."Objects" VALUES
  ('vm-1', 'APP01-DEV-HTTP', 10, 3001, '{"tags": {"owner": "TEAMNAME", "$values": [{"tag": "OPS"}, {"tag": "TEAMNAME-DEV"}]}}'),
  ('vm-2', 'NO-TEAM-TAG', 10, 3001, '{"tags": {"owner": "OTHER"}}'),
  ('vm-3', 'WRONG-CACHE', 11, 3001, '{"tags": {"owner": "TEAMNAME"}}'),
  ('vm-4', 'WRONG-CONN', 12, 3001, '{"tags": {"owner": "TEAMNAME"}}'),
  ('vm-5', 'NOT-A-VM', 10, 42, '{"tags": {"owner": "TEAMNAME"}}'),
  ('vm-6', 'SRV-TEST1', 10, 3001, '{"tags": {"owner": "myteamname"}}'),
  ('vm-7', 'SRV-DEV-TXT', 10, 3001, '{"tags": "{\"$values\":[{\"tag\":\"TEAMNAME-DEV\"}]}"}'),
  ('vm-8', 'SRV-DEV-ARRAY', 10, 3001, '{"tags": [{"tag": "TEAMNAME-DEV"}]}'),
  ('vm-9', 'SRV-DEV-BROKEN', 10, 3001, '{"tags": "{not json TEAMNAME"}'),
  ('vm-10', 'SRV-DEV-NUMBER', 10, 3001, '{"tags": 42}');
"#;

#[test]
fn load_hosts_filters_and_maps_rows() {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL no definido: omitiendo test");
        return;
    };
    let mut conn = PgConnection::establish(&url).expect("conn");
    conn.begin_test_transaction().expect("test tx");
    conn.batch_execute(FIXTURE).expect("fixture");

    let mut hosts = load_hosts(&mut conn, &HostQuery::default()).expect("load");
    hosts.sort_by(|a, b| a.object_id.cmp(&b.object_id));
    let names: Vec<&str> = hosts.iter().map(|h| h.object_name.as_str()).collect();
    assert_eq!(names, vec!["APP01-DEV-HTTP", "SRV-TEST1", "SRV-DEV-TXT"]);
    assert_eq!(hosts[0].app_region.as_deref(), Some("TEAMNAME-DEV"));
    assert_eq!(hosts[0].datasource_name, "vcenter-01");
    // ILIKE: coincide sin importar mayúsculas, pero sin tag con prefijo no hay región
    assert_eq!(hosts[1].app_region, None);
    // tags guardados como texto serializado se parsean del lado Rust
    assert_eq!(hosts[2].app_region.as_deref(), Some("TEAMNAME-DEV"));
}

#[test]
fn odd_tag_payloads_do_not_abort_the_query() {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL no definido: omitiendo test");
        return;
    };
    let mut conn = PgConnection::establish(&url).expect("conn");
    conn.begin_test_transaction().expect("test tx");
    conn.batch_execute(FIXTURE).expect("fixture");

    // arreglos, escalares y texto inválido nunca llegan al inventario, y no
    // se llevan puestas al resto de las filas
    let hosts = load_hosts(&mut conn, &HostQuery::default()).expect("load");
    assert_eq!(hosts.len(), 3);
    assert!(hosts.iter().all(|h| !matches!(h.object_name.as_str(), "SRV-DEV-ARRAY" | "SRV-DEV-BROKEN" | "SRV-DEV-NUMBER")));
}

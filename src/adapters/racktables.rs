// Copyright (c) 2025 - Cowboy AI, Inc.
//! RackTables Store Adapter
//!
//! Implements [`AddressSpaceStore`] over the RackTables MySQL schema.
//!
//! # Schema Mapping
//!
//! ```text
//! Network      <- IPv4Network + TagStorage(entity_realm='ipv4net') + TagTree
//! VLAN binding <- VLANIPv4
//! Allocation   <- IPv4Allocation + Object
//! Static use   <- IPv4Address
//! Object       <- Object + Dictionary (object type chapter)
//! Port         <- Port + PortInnerInterface + PortOuterInterface
//! Link         <- EntityLink (object -> object)
//! Compat       <- PortInterfaceCompat, ObjectParentCompat
//! VLAN         <- VLANDomain + VLANDescription
//! ```
//!
//! Addresses are stored as unsigned 32-bit integers and bound as such. Every
//! value is a bound parameter; only placeholder lists are built dynamically.
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_ipam::adapters::RackTablesStore;
//! use cim_ipam::config::IpamConfig;
//!
//! let config = IpamConfig::from_env()?;
//! let store = RackTablesStore::connect(&config.store).await?;
//! ```

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use std::net::Ipv4Addr;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::domain::{
    normalize_text, Allocation, AllocationKey, AllocationType, Ipv4Network, Link, MacAddress,
    Network, NetworkId, Object, Port, PortKey, Vlan, VlanId,
};
use crate::store::{
    at_most_one, AddressSpaceStore, AddressUse, CompatibilityTable, StoreError, StoreResult,
};

/// Dictionary chapter holding object types
const OBJECT_TYPE_CHAPTER: u32 = 1;

/// Connectivity-class failures become `Unavailable`, everything else `Query`
fn query_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => StoreError::Unavailable(err.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

/// Like [`query_error`], but a duplicate-key rejection becomes `Conflict`
fn write_error(err: sqlx::Error, key: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict {
                key: key.to_string(),
                reason: db_err.message().to_string(),
            };
        }
    }
    query_error(err)
}

fn get<'r, T>(row: &'r MySqlRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql>,
{
    row.try_get(column).map_err(query_error)
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn decode_network(row: &MySqlRow) -> StoreResult<Network> {
    let id: u32 = get(row, "id")?;
    let ip: u32 = get(row, "ip")?;
    let mask: u32 = get(row, "mask")?;
    let name: Option<String> = get(row, "name")?;

    let prefix = u8::try_from(mask)
        .map_err(|_| StoreError::Query(format!("network {} has mask {}", id, mask)))?;
    let network = Ipv4Network::new(Ipv4Addr::from(ip), prefix)
        .map_err(|e| StoreError::Query(format!("network {}: {}", id, e)))?;

    Ok(Network::new(
        NetworkId::from(id),
        network,
        name.unwrap_or_default(),
    ))
}

fn decode_vlan_id(raw: u32) -> StoreResult<VlanId> {
    u16::try_from(raw)
        .ok()
        .and_then(|id| VlanId::new(id).ok())
        .ok_or_else(|| StoreError::Query(format!("VLAN id {} out of range", raw)))
}

fn decode_allocation(row: &MySqlRow) -> StoreResult<Allocation> {
    let object: String = get(row, "object_name")?;
    let interface: String = get(row, "name")?;
    let ip: u32 = get(row, "ip")?;
    let kind: String = get(row, "type")?;

    let allocation_type: AllocationType = kind.parse().map_err(StoreError::Query)?;
    Ok(Allocation::new(object, interface, Ipv4Addr::from(ip)).with_type(allocation_type))
}

fn decode_object(row: &MySqlRow) -> StoreResult<Object> {
    Ok(Object {
        name: get(row, "name")?,
        label: normalize_text(get(row, "label")?),
        object_type: get(row, "objtype")?,
        asset_tag: normalize_text(get(row, "asset_no")?),
        comment: normalize_text(get(row, "comment")?),
    })
}

fn decode_port(row: &MySqlRow) -> StoreResult<Port> {
    let l2address: Option<String> = normalize_text(get(row, "l2address")?);
    let l2_address = l2address
        .map(|raw| {
            MacAddress::new(&raw).map_err(|e| StoreError::Query(format!("l2address: {}", e)))
        })
        .transpose()?;

    Ok(Port {
        object: get(row, "object_name")?,
        name: get(row, "name")?,
        inner_interface: get(row, "iif_name")?,
        outer_interface: get(row, "oif_name")?,
        l2_address,
        reservation: normalize_text(get(row, "reservation_comment")?),
        label: normalize_text(get(row, "label")?),
    })
}

/// Address space store backed by a RackTables database
#[derive(Debug, Clone)]
pub struct RackTablesStore {
    pool: MySqlPool,
}

impl RackTablesStore {
    /// Open a connection pool
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            max_connections = config.max_connections,
            "Connecting to RackTables database"
        );

        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn object_id(&self, name: &str) -> StoreResult<u32> {
        let rows = sqlx::query("SELECT id FROM `Object` WHERE name = ?")
            .bind(name)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        let row = at_most_one(rows, format!("object {}", name))?.ok_or_else(|| {
            StoreError::Missing {
                entity: "object",
                key: name.to_string(),
            }
        })?;
        get(&row, "id")
    }

    async fn object_type_id(&self, object_type: &str) -> StoreResult<u32> {
        let rows = sqlx::query(
            "SELECT dict_key FROM Dictionary WHERE chapter_id = ? AND dict_value = ?",
        )
        .bind(OBJECT_TYPE_CHAPTER)
        .bind(object_type)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;
        let row = at_most_one(rows, format!("object type {}", object_type))?.ok_or_else(|| {
            StoreError::Missing {
                entity: "object type",
                key: object_type.to_string(),
            }
        })?;
        get(&row, "dict_key")
    }

    /// (inner interface id, outer interface id) for a port's interface names
    async fn interface_ids(&self, port: &Port) -> StoreResult<(u32, u32)> {
        let iif = sqlx::query("SELECT id FROM PortInnerInterface WHERE iif_name = ?")
            .bind(&port.inner_interface)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?
            .ok_or_else(|| StoreError::Missing {
                entity: "inner interface",
                key: port.inner_interface.clone(),
            })?;
        let oif = sqlx::query("SELECT id FROM PortOuterInterface WHERE oif_name = ?")
            .bind(&port.outer_interface)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?
            .ok_or_else(|| StoreError::Missing {
                entity: "outer interface",
                key: port.outer_interface.clone(),
            })?;
        Ok((get(&iif, "id")?, get(&oif, "id")?))
    }

    async fn count(&self, sql: &str, a: &str, b: &str) -> StoreResult<i64> {
        let row = sqlx::query(sql)
            .bind(a)
            .bind(b)
            .fetch_one(&self.pool)
            .await
            .map_err(query_error)?;
        get(&row, "n")
    }
}

const ALLOCATION_COLUMNS: &str = "SELECT O.name AS object_name, A.name, A.ip, \
     CAST(A.`type` AS CHAR) AS `type` \
     FROM IPv4Allocation A JOIN `Object` O ON O.id = A.object_id";

const OBJECT_COLUMNS: &str = "SELECT O.name, O.label, D.dict_value AS objtype, O.asset_no, O.comment \
     FROM `Object` O JOIN Dictionary D ON D.dict_key = O.objtype_id";

const PORT_COLUMNS: &str = "SELECT O.name AS object_name, P.name, PII.iif_name, POI.oif_name, \
     P.l2address, P.reservation_comment, P.label \
     FROM Port P \
     JOIN `Object` O ON O.id = P.object_id \
     JOIN PortInnerInterface PII ON PII.id = P.iif_id \
     JOIN PortOuterInterface POI ON POI.id = P.`type`";

const LINK_COLUMNS: &str = "SELECT E.id, OP.name AS parent, OC.name AS child \
     FROM EntityLink E \
     JOIN `Object` OP ON OP.id = E.parent_entity_id \
     JOIN `Object` OC ON OC.id = E.child_entity_id \
     WHERE E.parent_entity_type = 'object' AND E.child_entity_type = 'object'";

#[async_trait]
impl AddressSpaceStore for RackTablesStore {
    async fn find_networks_by_tags(&self, tags: &[String]) -> StoreResult<Vec<Network>> {
        if tags.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT N.id, N.ip, N.mask, N.name, T.tag \
             FROM IPv4Network N \
             JOIN TagStorage TS ON TS.entity_id = N.id AND TS.entity_realm = 'ipv4net' \
             JOIN TagTree T ON T.id = TS.tag_id \
             WHERE T.tag IN ({}) \
             ORDER BY N.id",
            placeholders(tags.len())
        );
        let mut query = sqlx::query(&sql);
        for tag in tags {
            query = query.bind(tag);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(query_error)?;

        // One row per (network, matching tag); fold into networks in id order
        let mut networks: Vec<Network> = Vec::new();
        for row in &rows {
            let id = NetworkId::from(get::<u32>(row, "id")?);
            let tag: String = get(row, "tag")?;
            match networks.last_mut() {
                Some(last) if last.id == id => {
                    last.tags.insert(tag);
                }
                _ => {
                    let mut network = decode_network(row)?;
                    network.tags.insert(tag);
                    networks.push(network);
                }
            }
        }

        debug!(tags = ?tags, rows = rows.len(), networks = networks.len(), "tag lookup");
        Ok(networks)
    }

    async fn find_vlan_for_network(&self, network_id: NetworkId) -> StoreResult<Option<VlanId>> {
        let rows = sqlx::query("SELECT vlan_id FROM VLANIPv4 WHERE ipv4net_id = ?")
            .bind(network_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        match at_most_one(rows, format!("VLAN binding of network {}", network_id))? {
            Some(row) => Ok(Some(decode_vlan_id(get(&row, "vlan_id")?)?)),
            None => Ok(None),
        }
    }

    async fn find_network_containing(&self, address: Ipv4Addr) -> StoreResult<Option<Network>> {
        let row = sqlx::query(
            "SELECT id, ip, mask, name FROM IPv4Network \
             WHERE ((? ^ ip) & ((0xFFFFFFFF << (32 - mask)) & 0xFFFFFFFF)) = 0 \
             ORDER BY mask DESC LIMIT 1",
        )
        .bind(u32::from(address))
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;
        row.as_ref().map(decode_network).transpose()
    }

    async fn list_vlans(&self, domain: &str) -> StoreResult<Vec<Vlan>> {
        let rows = sqlx::query(
            "SELECT VD.vlan_id, VD.vlan_descr \
             FROM VLANDomain DOM JOIN VLANDescription VD ON VD.domain_id = DOM.id \
             WHERE DOM.description = ? \
             ORDER BY VD.vlan_id",
        )
        .bind(domain)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                let description: Option<String> = get(row, "vlan_descr")?;
                Ok(Vlan {
                    domain: domain.to_string(),
                    id: decode_vlan_id(get(row, "vlan_id")?)?,
                    description: description.unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn find_allocation(&self, address: Ipv4Addr) -> StoreResult<Option<AddressUse>> {
        let ip = u32::from(address);

        let allocated = sqlx::query(&format!("{} WHERE A.ip = ? LIMIT 1", ALLOCATION_COLUMNS))
            .bind(ip)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        if let Some(row) = allocated {
            return Ok(Some(AddressUse::Allocated(decode_allocation(&row)?)));
        }

        let reserved = sqlx::query("SELECT name FROM IPv4Address WHERE ip = ? LIMIT 1")
            .bind(ip)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;
        match reserved {
            Some(row) => Ok(Some(AddressUse::Static {
                name: normalize_text(get(&row, "name")?),
            })),
            None => Ok(None),
        }
    }

    async fn find_allocation_by_key(
        &self,
        key: &AllocationKey,
    ) -> StoreResult<Option<Allocation>> {
        let rows = sqlx::query(&format!(
            "{} WHERE O.name = ? AND A.name = ?",
            ALLOCATION_COLUMNS
        ))
        .bind(&key.object)
        .bind(&key.interface)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;
        at_most_one(rows, format!("allocation {}", key))?
            .as_ref()
            .map(decode_allocation)
            .transpose()
    }

    async fn allocations_for_object(&self, object: &str) -> StoreResult<Vec<Allocation>> {
        let rows = sqlx::query(&format!("{} WHERE O.name = ? ORDER BY A.ip", ALLOCATION_COLUMNS))
            .bind(object)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        rows.iter().map(decode_allocation).collect()
    }

    async fn create_allocation(&self, allocation: &Allocation) -> StoreResult<()> {
        let key = format!("allocation {}", allocation.key());
        let object_id = self.object_id(&allocation.object).await?;

        // The schema keys allocations by (object, address); (object, interface)
        // uniqueness is enforced by the insert condition
        let result = sqlx::query(
            "INSERT INTO IPv4Allocation (object_id, ip, name, `type`) \
             SELECT ?, ?, ?, ? FROM DUAL \
             WHERE NOT EXISTS (SELECT 1 FROM IPv4Allocation WHERE object_id = ? AND name = ?)",
        )
        .bind(object_id)
        .bind(u32::from(allocation.address))
        .bind(&allocation.interface)
        .bind(allocation.allocation_type.as_str())
        .bind(object_id)
        .bind(&allocation.interface)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &key))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict {
                key,
                reason: "an allocation already exists for this interface".to_string(),
            });
        }
        debug!(%key, "allocation created");
        Ok(())
    }

    async fn update_allocation(&self, allocation: &Allocation) -> StoreResult<()> {
        let key = format!("allocation {}", allocation.key());
        let object_id = self.object_id(&allocation.object).await?;

        sqlx::query("UPDATE IPv4Allocation SET ip = ?, `type` = ? WHERE object_id = ? AND name = ?")
            .bind(u32::from(allocation.address))
            .bind(allocation.allocation_type.as_str())
            .bind(object_id)
            .bind(&allocation.interface)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, &key))?;
        debug!(%key, "allocation updated");
        Ok(())
    }

    async fn delete_allocation(&self, key: &AllocationKey) -> StoreResult<()> {
        let result = sqlx::query(
            "DELETE A FROM IPv4Allocation A JOIN `Object` O ON O.id = A.object_id \
             WHERE O.name = ? AND A.name = ?",
        )
        .bind(&key.object)
        .bind(&key.interface)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing {
                entity: "allocation",
                key: key.to_string(),
            });
        }
        debug!(%key, "allocation deleted");
        Ok(())
    }

    async fn find_object(&self, name: &str) -> StoreResult<Option<Object>> {
        let rows = sqlx::query(&format!("{} WHERE O.name = ?", OBJECT_COLUMNS))
            .bind(name)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        at_most_one(rows, format!("object {}", name))?
            .as_ref()
            .map(decode_object)
            .transpose()
    }

    async fn has_object_type(&self, object_type: &str) -> StoreResult<bool> {
        match self.object_type_id(object_type).await {
            Ok(_) => Ok(true),
            Err(StoreError::Missing { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_object(&self, object: &Object) -> StoreResult<()> {
        let key = format!("object {}", object.name);
        let objtype_id = self.object_type_id(&object.object_type).await?;

        sqlx::query(
            "INSERT INTO `Object` (name, label, objtype_id, asset_no, has_problems, comment) \
             VALUES (?, ?, ?, ?, 'no', ?)",
        )
        .bind(&object.name)
        .bind(&object.label)
        .bind(objtype_id)
        .bind(&object.asset_tag)
        .bind(&object.comment)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &key))?;
        debug!(%key, "object created");
        Ok(())
    }

    async fn update_object(&self, object: &Object) -> StoreResult<()> {
        let key = format!("object {}", object.name);
        let objtype_id = self.object_type_id(&object.object_type).await?;

        sqlx::query(
            "UPDATE `Object` SET label = ?, objtype_id = ?, asset_no = ?, comment = ? \
             WHERE name = ?",
        )
        .bind(&object.label)
        .bind(objtype_id)
        .bind(&object.asset_tag)
        .bind(&object.comment)
        .bind(&object.name)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &key))?;
        debug!(%key, "object updated");
        Ok(())
    }

    async fn delete_object(&self, name: &str) -> StoreResult<()> {
        let object_id = self.object_id(name).await?;

        // Entity links are polymorphic and carry no foreign key; remove them
        // with the object. Ports and allocations cascade in the schema.
        let mut tx = self.pool.begin().await.map_err(query_error)?;
        sqlx::query(
            "DELETE FROM EntityLink \
             WHERE (parent_entity_type = 'object' AND parent_entity_id = ?) \
                OR (child_entity_type = 'object' AND child_entity_id = ?)",
        )
        .bind(object_id)
        .bind(object_id)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;
        sqlx::query("DELETE FROM `Object` WHERE id = ?")
            .bind(object_id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        tx.commit().await.map_err(query_error)?;

        debug!(object = name, "object deleted");
        Ok(())
    }

    async fn find_port(&self, key: &PortKey) -> StoreResult<Option<Port>> {
        let rows = sqlx::query(&format!("{} WHERE O.name = ? AND P.name = ?", PORT_COLUMNS))
            .bind(&key.object)
            .bind(&key.name)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        at_most_one(rows, format!("port {}", key))?
            .as_ref()
            .map(decode_port)
            .transpose()
    }

    async fn create_port(&self, port: &Port) -> StoreResult<()> {
        let key = format!("port {}", port.key());
        let object_id = self.object_id(&port.object).await?;
        let (iif_id, oif_id) = self.interface_ids(port).await?;

        sqlx::query(
            "INSERT INTO Port (object_id, name, iif_id, `type`, l2address, reservation_comment, label) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(object_id)
        .bind(&port.name)
        .bind(iif_id)
        .bind(oif_id)
        .bind(port.l2_address.as_ref().map(MacAddress::storage_form))
        .bind(&port.reservation)
        .bind(&port.label)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &key))?;
        debug!(%key, "port created");
        Ok(())
    }

    async fn update_port(&self, port: &Port) -> StoreResult<()> {
        let key = format!("port {}", port.key());
        let object_id = self.object_id(&port.object).await?;
        let (iif_id, oif_id) = self.interface_ids(port).await?;

        sqlx::query(
            "UPDATE Port SET iif_id = ?, `type` = ?, l2address = ?, reservation_comment = ?, label = ? \
             WHERE object_id = ? AND name = ?",
        )
        .bind(iif_id)
        .bind(oif_id)
        .bind(port.l2_address.as_ref().map(MacAddress::storage_form))
        .bind(&port.reservation)
        .bind(&port.label)
        .bind(object_id)
        .bind(&port.name)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &key))?;
        debug!(%key, "port updated");
        Ok(())
    }

    async fn delete_port(&self, key: &PortKey) -> StoreResult<()> {
        let result = sqlx::query(
            "DELETE P FROM Port P JOIN `Object` O ON O.id = P.object_id \
             WHERE O.name = ? AND P.name = ?",
        )
        .bind(&key.object)
        .bind(&key.name)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing {
                entity: "port",
                key: key.to_string(),
            });
        }
        debug!(%key, "port deleted");
        Ok(())
    }

    async fn find_link(&self, link: &Link) -> StoreResult<Option<Link>> {
        let rows = sqlx::query(&format!("{} AND OP.name = ? AND OC.name = ?", LINK_COLUMNS))
            .bind(&link.parent)
            .bind(&link.child)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        match at_most_one(rows, format!("link {}", link))? {
            Some(row) => Ok(Some(Link::new(
                get::<String>(&row, "parent")?,
                get::<String>(&row, "child")?,
            ))),
            None => Ok(None),
        }
    }

    async fn create_link(&self, link: &Link) -> StoreResult<()> {
        let key = format!("link {}", link);
        let parent_id = self.object_id(&link.parent).await?;
        let child_id = self.object_id(&link.child).await?;

        sqlx::query(
            "INSERT INTO EntityLink \
             (parent_entity_type, parent_entity_id, child_entity_type, child_entity_id) \
             VALUES ('object', ?, 'object', ?)",
        )
        .bind(parent_id)
        .bind(child_id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &key))?;
        debug!(%key, "link created");
        Ok(())
    }

    async fn delete_link(&self, link: &Link) -> StoreResult<()> {
        let result = sqlx::query(
            "DELETE E FROM EntityLink E \
             JOIN `Object` OP ON OP.id = E.parent_entity_id \
             JOIN `Object` OC ON OC.id = E.child_entity_id \
             WHERE E.parent_entity_type = 'object' AND E.child_entity_type = 'object' \
               AND OP.name = ? AND OC.name = ?",
        )
        .bind(&link.parent)
        .bind(&link.child)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing {
                entity: "link",
                key: link.to_string(),
            });
        }
        debug!(%link, "link deleted");
        Ok(())
    }

    async fn check_compatibility(
        &self,
        table: CompatibilityTable,
        kind_a: &str,
        kind_b: &str,
    ) -> StoreResult<bool> {
        let sql = match table {
            CompatibilityTable::PortInterface => {
                "SELECT COUNT(*) AS n FROM PortInterfaceCompat PIC \
                 JOIN PortInnerInterface PII ON PII.id = PIC.iif_id \
                 JOIN PortOuterInterface POI ON POI.id = PIC.oif_id \
                 WHERE PII.iif_name = ? AND POI.oif_name = ?"
            }
            CompatibilityTable::ObjectParent => {
                "SELECT COUNT(*) AS n FROM ObjectParentCompat OPC \
                 JOIN Dictionary DP ON DP.dict_key = OPC.parent_objtype_id \
                 JOIN Dictionary DC ON DC.dict_key = OPC.child_objtype_id \
                 WHERE DP.dict_value = ? AND DC.dict_value = ?"
            }
        };
        let n = self.count(sql, kind_a, kind_b).await?;
        debug!(%table, kind_a, kind_b, compatible = n > 0, "compatibility check");
        Ok(n > 0)
    }
}

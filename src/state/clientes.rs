// state/clientes.rs
// Borrower records.

use bson::{doc, oid::ObjectId};
use futures::stream::TryStreamExt;

use crate::error::{ApiError, ApiResult};
use crate::models::Cliente;

use super::{AppState, ahora};

pub async fn listar_clientes(state: &AppState) -> ApiResult<Vec<Cliente>> {
    let mut cursor = state.clientes.find(doc! {}).sort(doc! { "nombre": 1 }).await?;
    let mut clientes = Vec::new();
    while let Some(cliente) = cursor.try_next().await? {
        clientes.push(cliente);
    }
    Ok(clientes)
}

pub async fn get_cliente_por_id(state: &AppState, id: &ObjectId) -> ApiResult<Option<Cliente>> {
    Ok(state.clientes.find_one(doc! { "_id": id }).await?)
}

pub async fn crear_cliente(
    state: &AppState,
    documento: &str,
    nombre: &str,
    direccion: &str,
    telefono: &str,
    creado_por: &ObjectId,
) -> ApiResult<ObjectId> {
    if documento.trim().is_empty() || nombre.trim().is_empty() {
        return Err(ApiError::Validacion(
            "documento y nombre son obligatorios".into(),
        ));
    }
    if state
        .clientes
        .find_one(doc! { "documento": documento })
        .await?
        .is_some()
    {
        return Err(ApiError::Conflicto(format!(
            "ya existe un cliente con documento {documento}"
        )));
    }

    let res = state
        .clientes
        .insert_one(Cliente {
            id: None,
            documento: documento.to_string(),
            nombre: nombre.to_string(),
            direccion: direccion.to_string(),
            telefono: telefono.to_string(),
            activo: true,
            creado_por: *creado_por,
            creado: ahora(),
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::Interno(anyhow::anyhow!("insert de cliente sin _id")))
}

pub async fn actualizar_cliente(
    state: &AppState,
    id: &ObjectId,
    nombre: &str,
    direccion: &str,
    telefono: &str,
    activo: bool,
) -> ApiResult<()> {
    let res = state
        .clientes
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "nombre": nombre,
                "direccion": direccion,
                "telefono": telefono,
                "activo": activo,
            } },
        )
        .await?;
    if res.matched_count == 0 {
        return Err(ApiError::NoEncontrado("cliente no encontrado".into()));
    }
    Ok(())
}

/// Removes a borrower. With loans on file the record is only deactivated;
/// the returned flag says whether the row was physically deleted.
pub async fn eliminar_cliente(state: &AppState, id: &ObjectId) -> ApiResult<(Cliente, bool)> {
    let Some(cliente) = get_cliente_por_id(state, id).await? else {
        return Err(ApiError::NoEncontrado("cliente no encontrado".into()));
    };

    let tiene_prestamos = state
        .prestamos
        .find_one(doc! { "cliente_id": id })
        .await?
        .is_some();

    if tiene_prestamos {
        state
            .clientes
            .update_one(doc! { "_id": id }, doc! { "$set": { "activo": false } })
            .await?;
        Ok((cliente, false))
    } else {
        state.clientes.delete_one(doc! { "_id": id }).await?;
        Ok((cliente, true))
    }
}

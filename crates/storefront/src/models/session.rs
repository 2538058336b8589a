//! Session-stored state.
//!
//! The cart lives entirely in the visitor's session and is written back
//! after every change. Each write also issues a new checkout token, so a
//! token names one exact cart and submitting it twice yields one offer.

use tower_sessions::Session;
use uuid::Uuid;

use apogee_core::cart::Cart;

/// Session keys.
pub mod session_keys {
    /// The visitor's cart, serialized as JSON.
    pub const CART: &str = "cart";
    /// Idempotency token for the current cart contents.
    pub const CHECKOUT_TOKEN: &str = "checkout_token";
}

/// Load the cart from the session, or an empty one.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_cart(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Write the whole cart back and issue a fresh checkout token.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await?;
    session
        .insert(session_keys::CHECKOUT_TOKEN, Uuid::new_v4())
        .await
}

/// The checkout token for the cart as it is now.
///
/// Sessions written before tokens existed get one on first use.
///
/// # Errors
///
/// Returns an error if the session store cannot be read or written.
pub async fn checkout_token(session: &Session) -> Result<Uuid, tower_sessions::session::Error> {
    if let Some(token) = session.get::<Uuid>(session_keys::CHECKOUT_TOKEN).await? {
        return Ok(token);
    }
    let token = Uuid::new_v4();
    session.insert(session_keys::CHECKOUT_TOKEN, token).await?;
    Ok(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use tower_sessions::MemoryStore;

    use apogee_core::ProductId;
    use apogee_core::cart::CartItem;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_token_is_stable_until_the_cart_changes() {
        let session = session();
        let first = checkout_token(&session).await.unwrap();
        assert_eq!(checkout_token(&session).await.unwrap(), first);

        let mut cart = load_cart(&session).await.unwrap();
        cart.add(CartItem {
            product_id: ProductId::new(3),
            name: "Nose cone".to_string(),
            price: Decimal::new(1500, 2),
            quantity: 1,
            image: String::new(),
            description: String::new(),
        })
        .unwrap();
        save_cart(&session, &cart).await.unwrap();

        let second = checkout_token(&session).await.unwrap();
        assert_ne!(second, first);
        assert_eq!(checkout_token(&session).await.unwrap(), second);
        assert_eq!(load_cart(&session).await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_clearing_the_cart_retires_the_token() {
        let session = session();
        let before = checkout_token(&session).await.unwrap();
        save_cart(&session, &Cart::new()).await.unwrap();
        assert_ne!(checkout_token(&session).await.unwrap(), before);
    }
}

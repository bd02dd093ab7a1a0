use arenda::Store;
use arenda::config::SecurityConfig;
use arenda::db::{NewListing, NewUser};

async fn spawn_store() -> Store {
    Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to open in-memory store")
}

fn sample_listing(city: &str, price: i64, user_id: Option<i32>) -> NewListing {
    NewListing {
        price,
        rooms: 2,
        total_area: 54.5,
        kitchen_area: 10.0,
        floor: 3,
        total_floors: 9,
        deposit: 30000,
        commission_percent: 50.0,
        utilities_separate: true,
        allowed_children: false,
        allowed_pets: false,
        allowed_smoking: false,
        address_city: city.to_string(),
        address_street: "Lenina".to_string(),
        address_house: "12".to_string(),
        kind: "apartment".to_string(),
        description: "Bright two-room apartment".to_string(),
        user_id,
    }
}

fn fast_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    }
}

#[tokio::test]
async fn test_create_listing_persists_one_photo_row_per_path() {
    let store = spawn_store().await;

    let paths = vec![
        "images/listings/a.png".to_string(),
        "images/listings/b.png".to_string(),
        "images/listings/c.png".to_string(),
    ];

    let listing = store
        .create_listing(sample_listing("Moscow", 45000, None), &paths)
        .await
        .unwrap();

    assert_eq!(listing.title, "2-к. квартира, 54.5 м², 3/9 эт.");

    let photos = store.photos_for_listing(listing.id).await.unwrap();
    assert_eq!(photos.len(), 3);
    assert!(photos.iter().all(|p| p.listing_id == listing.id));

    // The batch lookup resolves the earliest-attached photo.
    let first = store.first_photo_paths(&[listing.id]).await.unwrap();
    assert_eq!(first[&listing.id], "images/listings/a.png");
}

#[tokio::test]
async fn test_delete_listing_cascades_photos_and_likes() {
    let store = spawn_store().await;
    let security = fast_security();

    let user = store
        .create_user(
            NewUser {
                name: "alice".to_string(),
                email: "alice@example.com".to_string(),
                phone: None,
                password: "secret".to_string(),
            },
            &security,
        )
        .await
        .unwrap();

    let listing = store
        .create_listing(
            sample_listing("Moscow", 45000, Some(user.id)),
            &["images/listings/a.png".to_string()],
        )
        .await
        .unwrap();
    store.add_like(listing.id, user.id).await.unwrap();

    assert!(store.delete_listing(listing.id).await.unwrap());

    assert!(store.get_listing(listing.id).await.unwrap().is_none());
    assert!(store.photos_for_listing(listing.id).await.unwrap().is_empty());
    assert!(!store.like_exists(listing.id, user.id).await.unwrap());

    // A second delete finds nothing and says so instead of erroring.
    assert!(!store.delete_listing(listing.id).await.unwrap());
}

#[tokio::test]
async fn test_duplicate_like_rejected_by_unique_index() {
    let store = spawn_store().await;
    let security = fast_security();

    let user = store
        .create_user(
            NewUser {
                name: "alice".to_string(),
                email: "alice@example.com".to_string(),
                phone: None,
                password: "secret".to_string(),
            },
            &security,
        )
        .await
        .unwrap();
    let listing = store
        .create_listing(sample_listing("Moscow", 45000, None), &[])
        .await
        .unwrap();

    store.add_like(listing.id, user.id).await.unwrap();

    // The API checks existence first; if two raced past the check, the
    // second insert dies on the composite index.
    assert!(store.add_like(listing.id, user.id).await.is_err());

    let likers = store.liker_ids_for_listings(&[listing.id]).await.unwrap();
    assert_eq!(likers[&listing.id], vec![user.id]);
}

#[tokio::test]
async fn test_liker_ids_keep_insertion_order() {
    let store = spawn_store().await;
    let security = fast_security();

    let mut user_ids = Vec::new();
    for (name, email) in [
        ("alice", "alice@example.com"),
        ("bob", "bob@example.com"),
        ("carol", "carol@example.com"),
    ] {
        let user = store
            .create_user(
                NewUser {
                    name: name.to_string(),
                    email: email.to_string(),
                    phone: None,
                    password: "secret".to_string(),
                },
                &security,
            )
            .await
            .unwrap();
        user_ids.push(user.id);
    }

    let listing = store
        .create_listing(sample_listing("Moscow", 45000, None), &[])
        .await
        .unwrap();

    for id in &user_ids {
        store.add_like(listing.id, *id).await.unwrap();
    }

    let likers = store.liker_ids_for_listings(&[listing.id]).await.unwrap();
    assert_eq!(likers[&listing.id], user_ids);
}

#[tokio::test]
async fn test_verify_password() {
    let store = spawn_store().await;
    let security = fast_security();

    store
        .create_user(
            NewUser {
                name: "alice".to_string(),
                email: "alice@example.com".to_string(),
                phone: None,
                password: "secret".to_string(),
            },
            &security,
        )
        .await
        .unwrap();

    assert!(store
        .verify_user_password("alice@example.com", "secret")
        .await
        .unwrap());
    assert!(!store
        .verify_user_password("alice@example.com", "wrong")
        .await
        .unwrap());
    assert!(!store
        .verify_user_password("nobody@example.com", "secret")
        .await
        .unwrap());
}

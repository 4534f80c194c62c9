use axum::extract::Multipart;

use super::model::Upload;

async fn read_files(multipart: &mut Multipart, field_name: &str) -> super::Result<Vec<Upload>> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_owned();
        let content = field.bytes().await?;
        files.push(Upload::new(filename, content));
    }

    Ok(files)
}

pub(super) mod api {
    use axum::{
        Json,
        extract::{
            Multipart, Path, State,
            multipart::MultipartRejection,
            rejection::JsonRejection,
        },
        http::{StatusCode, header},
        response::IntoResponse,
    };
    use bytes::Bytes;

    use crate::club::{
        self,
        model::{Envelope, NewClub},
    };

    fn png(content: Bytes) -> impl IntoResponse {
        ([(header::CONTENT_TYPE, "image/png")], content)
    }

    pub async fn create(
        club_service: State<club::Service>,
        payload: Result<Json<NewClub>, JsonRejection>,
    ) -> club::Result<impl IntoResponse> {
        let Json(c) = payload?;
        let id = club_service.create(c).await?;

        Ok((
            StatusCode::CREATED,
            Json(Envelope::ok(id).describe("club created")),
        ))
    }

    pub async fn upload_thumbnail(
        Path(id): Path<String>,
        club_service: State<club::Service>,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> club::Result<impl IntoResponse> {
        let mut multipart = multipart?;
        let file = super::read_files(&mut multipart, "thumbnail")
            .await?
            .into_iter()
            .next();

        let thumbnail_id = club_service.upload_thumbnail(&id, file).await?;

        Ok((
            StatusCode::CREATED,
            Json(Envelope::ok(thumbnail_id).describe("thumbnail uploaded")),
        ))
    }

    pub async fn upload_photos(
        Path(id): Path<String>,
        club_service: State<club::Service>,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> club::Result<impl IntoResponse> {
        let mut multipart = multipart?;
        let files = super::read_files(&mut multipart, "photos").await?;

        let photo_ids = club_service.upload_photos(&id, files).await?;

        Ok((
            StatusCode::CREATED,
            Json(Envelope::ok(photo_ids).describe("photos uploaded")),
        ))
    }

    pub async fn find_ids(club_service: State<club::Service>) -> club::Result<impl IntoResponse> {
        let ids = club_service.find_ids().await?;
        Ok(Json(Envelope::ok(ids)))
    }

    pub async fn concise_info(
        Path(id): Path<String>,
        club_service: State<club::Service>,
    ) -> club::Result<impl IntoResponse> {
        let info = club_service.find_concise_info(&id).await?;
        Ok(Json(Envelope::ok(info)))
    }

    pub async fn detail_info(
        Path(id): Path<String>,
        club_service: State<club::Service>,
    ) -> club::Result<impl IntoResponse> {
        let info = club_service.find_detail_info(&id).await?;
        Ok(Json(Envelope::ok(info)))
    }

    pub async fn thumbnail(
        Path(id): Path<String>,
        club_service: State<club::Service>,
    ) -> club::Result<impl IntoResponse> {
        let content = club_service.find_thumbnail(&id).await?;
        Ok(png(content))
    }

    pub async fn photo_ids(
        Path(id): Path<String>,
        club_service: State<club::Service>,
    ) -> club::Result<impl IntoResponse> {
        let ids = club_service.find_photo_ids(&id).await?;
        Ok(Json(Envelope::ok(ids)))
    }

    pub async fn photo(
        Path((id, photo_id)): Path<(String, String)>,
        club_service: State<club::Service>,
    ) -> club::Result<impl IntoResponse> {
        let content = club_service.find_photo(&id, &photo_id).await?;
        Ok(png(content))
    }

    pub async fn delete(
        Path(id): Path<String>,
        club_service: State<club::Service>,
    ) -> club::Result<impl IntoResponse> {
        club_service.delete(&id).await?;
        Ok(Json(Envelope::done("club deleted")))
    }

    pub async fn delete_thumbnail(
        Path(id): Path<String>,
        club_service: State<club::Service>,
    ) -> club::Result<impl IntoResponse> {
        club_service.delete_thumbnail(&id).await?;
        Ok(Json(Envelope::done("thumbnail deleted")))
    }

    pub async fn delete_photo(
        Path((id, photo_id)): Path<(String, String)>,
        club_service: State<club::Service>,
    ) -> club::Result<impl IntoResponse> {
        club_service.delete_photo(&id, &photo_id).await?;
        Ok(Json(Envelope::done("photo deleted")))
    }
}
